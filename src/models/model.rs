//! Candidate functional forms.
//!
//! The fitter relies on two primitive operations per model:
//! - predict `y(x)` given the parameter vector (for residuals/plots)
//! - fill the Jacobian row `∂y/∂pⱼ` at `x` (for Levenberg–Marquardt steps)
//!
//! Polynomial parameters are ordered from the highest power down to the
//! constant term, matching the `a·xᵏ + … + e` notation.

use serde::{Deserialize, Serialize};

/// Concrete functional form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// `a·x + b`
    Linear,
    /// `a·x² + b·x + c`
    Quadratic,
    /// `a·x³ + b·x² + c·x + d`
    Cubic,
    /// `a·x⁴ + b·x³ + c·x² + d·x + e`
    Quartic,
    /// `a·exp(b·x)`
    Exponential,
    /// `a·ln(x) + b`
    Logarithmic,
    /// `a·x^b`
    Power,
    /// `a·sin(b·x + c) + d`
    Sinusoidal,
    /// `a·cos(b·x + c) + d`
    Cosinusoidal,
}

impl ModelKind {
    pub const ALL: [ModelKind; 9] = [
        ModelKind::Linear,
        ModelKind::Quadratic,
        ModelKind::Cubic,
        ModelKind::Quartic,
        ModelKind::Exponential,
        ModelKind::Logarithmic,
        ModelKind::Power,
        ModelKind::Sinusoidal,
        ModelKind::Cosinusoidal,
    ];

    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::Linear => "Linear",
            ModelKind::Quadratic => "Quadratic",
            ModelKind::Cubic => "Cubic",
            ModelKind::Quartic => "4th-degree polynomial",
            ModelKind::Exponential => "Exponential",
            ModelKind::Logarithmic => "Logarithmic",
            ModelKind::Power => "Power",
            ModelKind::Sinusoidal => "Sinusoidal",
            ModelKind::Cosinusoidal => "Cosinusoidal",
        }
    }

    /// Formula with named parameters, for reports.
    pub fn formula(self) -> &'static str {
        match self {
            ModelKind::Linear => "a*x + b",
            ModelKind::Quadratic => "a*x^2 + b*x + c",
            ModelKind::Cubic => "a*x^3 + b*x^2 + c*x + d",
            ModelKind::Quartic => "a*x^4 + b*x^3 + c*x^2 + d*x + e",
            ModelKind::Exponential => "a*exp(b*x)",
            ModelKind::Logarithmic => "a*ln(x) + b",
            ModelKind::Power => "a*x^b",
            ModelKind::Sinusoidal => "a*sin(b*x + c) + d",
            ModelKind::Cosinusoidal => "a*cos(b*x + c) + d",
        }
    }

    /// Length of the parameter vector.
    pub fn param_count(self) -> usize {
        match self {
            ModelKind::Linear
            | ModelKind::Exponential
            | ModelKind::Logarithmic
            | ModelKind::Power => 2,
            ModelKind::Quadratic => 3,
            ModelKind::Cubic | ModelKind::Sinusoidal | ModelKind::Cosinusoidal => 4,
            ModelKind::Quartic => 5,
        }
    }

    /// Starting point for the optimizer (all ones).
    pub fn initial_params(self) -> Vec<f64> {
        vec![1.0; self.param_count()]
    }

    /// Whether the function is only defined for `x > 0`.
    pub fn requires_positive_x(self) -> bool {
        matches!(self, ModelKind::Logarithmic | ModelKind::Power)
    }

    /// Predict `y(x)`.
    ///
    /// # Panics
    /// Panics if `params` is shorter than `self.param_count()`.
    pub fn predict(self, params: &[f64], x: f64) -> f64 {
        match self {
            ModelKind::Linear | ModelKind::Quadratic | ModelKind::Cubic | ModelKind::Quartic => {
                horner(&params[..self.param_count()], x)
            }
            ModelKind::Exponential => params[0] * (params[1] * x).exp(),
            ModelKind::Logarithmic => params[0] * x.ln() + params[1],
            ModelKind::Power => params[0] * x.powf(params[1]),
            ModelKind::Sinusoidal => params[0] * (params[1] * x + params[2]).sin() + params[3],
            ModelKind::Cosinusoidal => params[0] * (params[1] * x + params[2]).cos() + params[3],
        }
    }

    /// Fill the Jacobian row `∂y/∂pⱼ` at `x`.
    ///
    /// # Panics
    /// Panics if `params` or `out` is shorter than `self.param_count()`.
    pub fn fill_jacobian_row(self, params: &[f64], x: f64, out: &mut [f64]) {
        match self {
            ModelKind::Linear | ModelKind::Quadratic | ModelKind::Cubic | ModelKind::Quartic => {
                // Highest power first; the constant column is last.
                let k = self.param_count();
                let mut pow = 1.0;
                for j in (0..k).rev() {
                    out[j] = pow;
                    pow *= x;
                }
            }
            ModelKind::Exponential => {
                let e = (params[1] * x).exp();
                out[0] = e;
                out[1] = params[0] * x * e;
            }
            ModelKind::Logarithmic => {
                out[0] = x.ln();
                out[1] = 1.0;
            }
            ModelKind::Power => {
                let p = x.powf(params[1]);
                out[0] = p;
                out[1] = params[0] * p * x.ln();
            }
            ModelKind::Sinusoidal => {
                let phase = params[1] * x + params[2];
                let c = phase.cos();
                out[0] = phase.sin();
                out[1] = params[0] * x * c;
                out[2] = params[0] * c;
                out[3] = 1.0;
            }
            ModelKind::Cosinusoidal => {
                let phase = params[1] * x + params[2];
                let s = phase.sin();
                out[0] = phase.cos();
                out[1] = -params[0] * x * s;
                out[2] = -params[0] * s;
                out[3] = 1.0;
            }
        }
    }
}

fn horner(coeffs: &[f64], x: f64) -> f64 {
    coeffs.iter().fold(0.0, |acc, &c| acc * x + c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polynomials_use_highest_power_first() {
        assert_eq!(ModelKind::Linear.predict(&[3.0, 5.0], 2.0), 11.0);
        assert_eq!(ModelKind::Quadratic.predict(&[1.0, 0.0, -4.0], 3.0), 5.0);
        assert_eq!(ModelKind::Quartic.predict(&[1.0, 0.0, 0.0, 0.0, 1.0], 2.0), 17.0);
    }

    #[test]
    fn jacobian_matches_finite_differences() {
        let cases: [(ModelKind, &[f64], f64); 9] = [
            (ModelKind::Linear, &[2.0, -1.0], 1.5),
            (ModelKind::Quadratic, &[0.5, 2.0, -1.0], 1.5),
            (ModelKind::Cubic, &[0.1, 0.5, 2.0, -1.0], 1.5),
            (ModelKind::Quartic, &[0.01, 0.1, 0.5, 2.0, -1.0], 1.5),
            (ModelKind::Exponential, &[2.0, 0.3], 1.5),
            (ModelKind::Logarithmic, &[2.0, 1.0], 1.5),
            (ModelKind::Power, &[2.0, 0.7], 1.5),
            (ModelKind::Sinusoidal, &[2.0, 0.7, 0.2, 1.0], 1.5),
            (ModelKind::Cosinusoidal, &[2.0, 0.7, 0.2, 1.0], 1.5),
        ];

        for (kind, params, x) in cases {
            let k = kind.param_count();
            let mut row = vec![0.0; k];
            kind.fill_jacobian_row(params, x, &mut row);
            for j in 0..k {
                let h = 1e-6;
                let mut up = params.to_vec();
                let mut down = params.to_vec();
                up[j] += h;
                down[j] -= h;
                let fd = (kind.predict(&up, x) - kind.predict(&down, x)) / (2.0 * h);
                assert!(
                    (fd - row[j]).abs() < 1e-6,
                    "{kind:?} d/dp{j}: analytic={} fd={fd}",
                    row[j]
                );
            }
        }
    }

    #[test]
    fn domain_restricted_models_yield_nan_for_non_positive_x() {
        assert!(ModelKind::Logarithmic.predict(&[1.0, 1.0], -1.0).is_nan());
        assert!(ModelKind::Power.predict(&[1.0, 0.5], -1.0).is_nan());
        assert!(ModelKind::Logarithmic.requires_positive_x());
        assert!(!ModelKind::Exponential.requires_positive_x());
    }
}
