//! Error types.
//!
//! Two layers:
//!
//! - typed errors raised by the calibration core (`CalibError`, `FitFailure`,
//!   `RegistryError`) so callers and tests can match on what went wrong
//! - `AppError`, the process-level error carrying an exit code for `fcal`
//!
//! Exit codes: `2` invalid input/configuration/I/O, `3` insufficient data or
//! no model converged, `4` numerical failure on the full dataset.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Why a single model could not be fitted or scored.
///
/// These never abort a run on their own: the model is skipped and the reason
/// is kept for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The model function is undefined for some x (e.g. `ln(x)` with `x <= 0`).
    DomainError,
    /// The optimizer could not find any step that reduced the residuals.
    NonConvergence,
    /// The iteration cap was reached before convergence.
    MaxIterationsExceeded,
    /// At least one parameter has no influence on the predictions.
    SingularJacobian,
    /// NaN or infinity in predictions or parameters.
    NonFiniteResult,
    /// The target has zero variance (or no points), so R² is undefined.
    DegenerateTarget,
    /// R² came out above 1 or NaN.
    InvalidRSquared,
}

impl FailureReason {
    pub fn describe(self) -> &'static str {
        match self {
            FailureReason::DomainError => "model undefined for the given x values",
            FailureReason::NonConvergence => "optimizer did not converge",
            FailureReason::MaxIterationsExceeded => "maximum iterations exceeded",
            FailureReason::SingularJacobian => "singular Jacobian",
            FailureReason::NonFiniteResult => "non-finite result",
            FailureReason::DegenerateTarget => "degenerate target (zero variance)",
            FailureReason::InvalidRSquared => "invalid R² (above 1 or NaN)",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// A model that was attempted and skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{model_name}: {reason}")]
pub struct FitFailure {
    pub model_name: String,
    pub reason: FailureReason,
}

impl FitFailure {
    pub fn new(model_name: impl Into<String>, reason: FailureReason) -> Self {
        Self {
            model_name: model_name.into(),
            reason,
        }
    }
}

/// Fatal errors of a calibration run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalibError {
    #[error("Invalid calibration point count: n={requested}, expected 2 <= n <= {available}.")]
    InvalidParameterCount { requested: usize, available: usize },

    #[error("Input has {found} column(s); at least 2 (x and y) are required.")]
    InsufficientColumns { found: usize },

    #[error("No model converged:{}", format_failures(.failures))]
    NoModelConverged { failures: Vec<FitFailure> },

    #[error("Selected model {model_name} produced non-finite predictions on the full dataset.")]
    NonFiniteFullDataset { model_name: String },
}

fn format_failures(failures: &[FitFailure]) -> String {
    failures.iter().map(|f| format!("\n  - {f}")).collect()
}

impl CalibError {
    pub fn exit_code(&self) -> u8 {
        match self {
            CalibError::InvalidParameterCount { .. } | CalibError::InsufficientColumns { .. } => 2,
            CalibError::NoModelConverged { .. } => 3,
            CalibError::NonFiniteFullDataset { .. } => 4,
        }
    }
}

impl From<CalibError> for AppError {
    fn from(err: CalibError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

/// Invalid model catalogue configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Model registry is empty.")]
    Empty,

    #[error("Model {name}: {found} initial parameter(s), expected {expected}.")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("Duplicate model name in registry: {name}")]
    DuplicateName { name: String },

    #[error("Unknown model: {name}")]
    UnknownModel { name: String },
}

impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        AppError::new(2, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_model_converged_lists_every_failure() {
        let err = CalibError::NoModelConverged {
            failures: vec![
                FitFailure::new("Logarithmic", FailureReason::DomainError),
                FitFailure::new("Power", FailureReason::DomainError),
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("Logarithmic: model undefined"));
        assert!(msg.contains("Power: model undefined"));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn calib_error_maps_to_app_exit_code() {
        let err: AppError = CalibError::InvalidParameterCount {
            requested: 1,
            available: 5,
        }
        .into();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("n=1"));
    }
}
