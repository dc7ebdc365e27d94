//! Low-level fitting routine for a single model.
//!
//! Given:
//! - calibration x values (raw sensor readings)
//! - calibration y values (reference force)
//! - a model spec (functional form + starting parameters)
//!
//! we run Levenberg–Marquardt from the registry entry's starting point (plus a
//! log-linear start for Exponential/Power) and return the fitted parameter
//! vector, or the reason the model has to be skipped.

use nalgebra::{DMatrix, DVector};

use crate::error::{FailureReason, FitFailure};
use crate::math::{LeastSquaresProblem, LmError, LmOptions, LmOutcome, minimize, solve_least_squares};
use crate::models::{ModelKind, ModelSpec};

/// Fitting options shared by every model in a run.
#[derive(Debug, Clone, Copy)]
pub struct FitOptions {
    /// Iteration cap per model; hitting it skips the model.
    pub max_iterations: usize,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self { max_iterations: 400 }
    }
}

/// Residual problem `y − f(p, x)` for one model over borrowed data.
struct CurveProblem<'a> {
    kind: ModelKind,
    xs: &'a [f64],
    ys: &'a [f64],
}

impl LeastSquaresProblem for CurveProblem<'_> {
    fn residual_count(&self) -> usize {
        self.xs.len()
    }

    fn residuals(&self, params: &[f64], out: &mut [f64]) -> bool {
        for (i, (&x, &y)) in self.xs.iter().zip(self.ys.iter()).enumerate() {
            out[i] = y - self.kind.predict(params, x);
        }
        out.iter().all(|v| v.is_finite())
    }

    fn jacobian(&self, params: &[f64], out: &mut DMatrix<f64>) -> bool {
        let mut row = vec![0.0; self.kind.param_count()];
        for (i, &x) in self.xs.iter().enumerate() {
            self.kind.fill_jacobian_row(params, x, &mut row);
            for (j, &v) in row.iter().enumerate() {
                out[(i, j)] = v;
            }
        }
        out.iter().all(|v| v.is_finite())
    }
}

/// Fit one model to `(xs, ys)`.
///
/// Levenberg–Marquardt always starts from `spec.initial_params`. Exponential
/// and Power also start from a log-linear fit of the data when one exists;
/// the lower-cost converged run wins (the registry start on ties).
///
/// On success the returned vector has the same length as
/// `spec.initial_params` and is entirely finite.
pub fn fit_model(
    spec: &ModelSpec,
    xs: &[f64],
    ys: &[f64],
    opts: &FitOptions,
) -> Result<Vec<f64>, FitFailure> {
    let fail = |reason| FitFailure::new(spec.name.clone(), reason);

    if xs.is_empty() || xs.len() != ys.len() {
        return Err(fail(FailureReason::DegenerateTarget));
    }
    if spec.kind.requires_positive_x() && xs.iter().any(|&x| !(x > 0.0)) {
        return Err(fail(FailureReason::DomainError));
    }
    if xs.iter().chain(ys.iter()).any(|v| !v.is_finite()) {
        return Err(fail(FailureReason::NonFiniteResult));
    }
    // Fewer distinct x than parameters: the Jacobian is rank-deficient.
    if distinct_count(xs) < spec.kind.param_count() {
        return Err(fail(FailureReason::SingularJacobian));
    }

    let problem = CurveProblem {
        kind: spec.kind,
        xs,
        ys,
    };
    let lm_opts = LmOptions {
        max_iterations: opts.max_iterations,
        ..LmOptions::default()
    };

    let mut starts = vec![spec.initial_params.clone()];
    if let Some(seed) = log_linear_seed(spec.kind, xs, ys) {
        starts.push(seed);
    }

    let mut best: Option<LmOutcome> = None;
    let mut first_error: Option<LmError> = None;
    for start in &starts {
        match minimize(&problem, start, &lm_opts) {
            Ok(outcome) if outcome.params.iter().all(|v| v.is_finite()) => {
                if best.as_ref().is_none_or(|b| outcome.cost < b.cost) {
                    best = Some(outcome);
                }
            }
            Ok(_) => {
                first_error.get_or_insert(LmError::NonFinite);
            }
            Err(e) => {
                log::debug!("{}: start {start:?} failed: {e:?}", spec.name);
                first_error.get_or_insert(e);
            }
        }
    }

    let Some(outcome) = best else {
        return Err(fail(match first_error.unwrap_or(LmError::NoProgress) {
            LmError::NonFinite => FailureReason::NonFiniteResult,
            LmError::SingularJacobian => FailureReason::SingularJacobian,
            LmError::NoProgress => FailureReason::NonConvergence,
            LmError::MaxIterations => FailureReason::MaxIterationsExceeded,
        }));
    };

    log::debug!(
        "{}: converged after {} iteration(s) ({:?}), cost={:.3e}",
        spec.name,
        outcome.iterations,
        outcome.termination,
        outcome.cost
    );

    if outcome.params.len() != spec.initial_params.len() {
        return Err(fail(FailureReason::NonFiniteResult));
    }
    Ok(outcome.params)
}

fn distinct_count(xs: &[f64]) -> usize {
    let mut sorted = xs.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted.dedup();
    sorted.len()
}

/// Starting point from a straight-line fit in log space.
///
/// - Exponential: `ln|y| = ln|a| + b·x`
/// - Power: `ln|y| = ln|a| + b·ln(x)`
///
/// Needs every y non-zero and of one sign.
fn log_linear_seed(kind: ModelKind, xs: &[f64], ys: &[f64]) -> Option<Vec<f64>> {
    let regressor: fn(f64) -> f64 = match kind {
        ModelKind::Exponential => |x| x,
        ModelKind::Power => f64::ln,
        _ => return None,
    };
    let sign = ys.first()?.signum();
    if ys.iter().any(|&y| y == 0.0 || y.signum() != sign) {
        return None;
    }

    let design = DMatrix::from_fn(xs.len(), 2, |i, j| if j == 0 { regressor(xs[i]) } else { 1.0 });
    let target = DVector::from_iterator(ys.len(), ys.iter().map(|y| y.abs().ln()));
    let beta = solve_least_squares(&design, &target)?;

    let seed = vec![sign * beta[1].exp(), beta[0]];
    (seed.iter().all(|v| v.is_finite()) && seed[0] != 0.0).then_some(seed)
}
