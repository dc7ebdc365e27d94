//! Levenberg–Marquardt nonlinear least squares.
//!
//! Minimizes `‖r(p)‖²` where `r(p) = y − f(p)`. Each iteration:
//!
//! - builds the model Jacobian `J = ∂f/∂p` at the current point
//! - scales columns to unit norm (`Js = J·D⁻¹`) so badly scaled parameters
//!   (e.g. the `x⁴` coefficient on raw sensor counts) stay solvable
//! - solves the damped step `[Js; √λ·I] δs = [r; 0]` via SVD and unscales it
//! - accepts the step if the cost drops (λ ÷ 10), otherwise retries (λ × 10)
//!
//! Termination follows the usual MINPACK-style tests on relative cost
//! reduction (`ftol`, actual and predicted), scaled step length (`xtol`) and
//! gradient/residual cosine (`gtol`).

use nalgebra::{DMatrix, DVector};

use crate::math::ols::{damped_system, solve_least_squares};

const INITIAL_LAMBDA: f64 = 1e-3;
const MIN_LAMBDA: f64 = 1e-15;
const MAX_LAMBDA: f64 = 1e16;

/// A nonlinear least squares problem `y ≈ f(p)`.
pub trait LeastSquaresProblem {
    /// Number of residuals (observations).
    fn residual_count(&self) -> usize;

    /// Write `y − f(p)` into `out`. Returns `false` if any value is non-finite.
    fn residuals(&self, params: &[f64], out: &mut [f64]) -> bool;

    /// Write `∂f/∂p` (one row per observation) into `out`.
    /// Returns `false` if any value is non-finite.
    fn jacobian(&self, params: &[f64], out: &mut DMatrix<f64>) -> bool;
}

/// Solver tolerances and iteration cap.
#[derive(Debug, Clone, Copy)]
pub struct LmOptions {
    pub max_iterations: usize,
    pub ftol: f64,
    pub xtol: f64,
    pub gtol: f64,
}

impl Default for LmOptions {
    fn default() -> Self {
        Self {
            max_iterations: 400,
            ftol: 1e-12,
            xtol: 1e-12,
            gtol: 1e-12,
        }
    }
}

/// Which test stopped the solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Residuals are exactly zero.
    ExactFit,
    CostReduction,
    StepSize,
    Gradient,
}

#[derive(Debug, Clone)]
pub struct LmOutcome {
    pub params: Vec<f64>,
    pub cost: f64,
    pub iterations: usize,
    pub termination: Termination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LmError {
    /// Residuals or Jacobian are non-finite at an accepted point.
    NonFinite,
    /// A Jacobian column is identically zero.
    SingularJacobian,
    /// No damping level produced a solvable step.
    NoProgress,
    MaxIterations,
}

/// Run Levenberg–Marquardt from `initial`.
pub fn minimize<P: LeastSquaresProblem>(
    problem: &P,
    initial: &[f64],
    opts: &LmOptions,
) -> Result<LmOutcome, LmError> {
    let n = problem.residual_count();
    let k = initial.len();

    let mut p = DVector::from_column_slice(initial);
    let mut r = DVector::<f64>::zeros(n);
    if !problem.residuals(p.as_slice(), r.as_mut_slice()) {
        return Err(LmError::NonFinite);
    }
    let mut cost = r.norm_squared();
    if !cost.is_finite() {
        return Err(LmError::NonFinite);
    }
    let mut r_trial = DVector::<f64>::zeros(n);
    let mut jac = DMatrix::<f64>::zeros(n, k);
    let mut lambda = INITIAL_LAMBDA;

    for iter in 1..=opts.max_iterations {
        if cost == 0.0 {
            return Ok(outcome(p, cost, iter - 1, Termination::ExactFit));
        }

        if !problem.jacobian(p.as_slice(), &mut jac) {
            return Err(LmError::NonFinite);
        }
        let d: Vec<f64> = jac.column_iter().map(|c| c.norm()).collect();
        if d.iter().any(|&v| !(v.is_finite() && v > 0.0)) {
            return Err(LmError::SingularJacobian);
        }
        let mut js = jac.clone();
        for (j, &dj) in d.iter().enumerate() {
            js.column_mut(j).unscale_mut(dj);
        }

        let gradient = js.tr_mul(&r);
        if gradient.amax() <= opts.gtol * r.norm() {
            return Ok(outcome(p, cost, iter, Termination::Gradient));
        }

        let scaled_p_norm = p
            .iter()
            .zip(d.iter())
            .map(|(pj, dj)| (pj * dj).powi(2))
            .sum::<f64>()
            .sqrt();
        let step_limit = opts.xtol * (scaled_p_norm + opts.xtol);

        // Inner loop: raise damping until a step reduces the cost.
        loop {
            let (aug, rhs) = damped_system(&js, &r, lambda);
            let Some(step_scaled) = solve_least_squares(&aug, &rhs) else {
                lambda *= 10.0;
                if lambda > MAX_LAMBDA {
                    return Err(LmError::NoProgress);
                }
                continue;
            };
            let step_norm = step_scaled.norm();
            // Cost reduction the linearized model expects from this step.
            let predicted = cost - (&r - &js * &step_scaled).norm_squared();
            let delta = DVector::from_iterator(
                k,
                step_scaled.iter().zip(d.iter()).map(|(s, dj)| s / dj),
            );
            let trial = &p + &delta;

            let trial_ok = problem.residuals(trial.as_slice(), r_trial.as_mut_slice());
            let trial_cost = r_trial.norm_squared();
            if trial_ok && trial_cost.is_finite() && trial_cost < cost {
                let reduction = cost - trial_cost;
                let prev_cost = cost;
                p = trial;
                std::mem::swap(&mut r, &mut r_trial);
                cost = trial_cost;
                lambda = (lambda / 10.0).max(MIN_LAMBDA);

                // Actual and predicted relative reductions both below ftol.
                if reduction <= opts.ftol * prev_cost && predicted <= opts.ftol * prev_cost {
                    return Ok(outcome(p, cost, iter, Termination::CostReduction));
                }
                if step_norm <= step_limit {
                    return Ok(outcome(p, cost, iter, Termination::StepSize));
                }
                break;
            }

            // No reduction possible within numerical resolution of the point.
            if step_norm <= step_limit {
                return Ok(outcome(p, cost, iter, Termination::StepSize));
            }
            lambda *= 10.0;
            if lambda > MAX_LAMBDA {
                return Err(LmError::NoProgress);
            }
        }
    }

    Err(LmError::MaxIterations)
}

fn outcome(p: DVector<f64>, cost: f64, iterations: usize, termination: Termination) -> LmOutcome {
    LmOutcome {
        params: p.iter().copied().collect(),
        cost,
        iterations,
        termination,
    }
}
