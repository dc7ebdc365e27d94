//! Goodness-of-fit scoring.
//!
//! - `R² = 1 − SS_res / SS_tot`
//! - `RMSE = sqrt(SS_res / n)`
//!
//! `SS_tot = 0` (constant target) leaves R² undefined and is reported as
//! `DegenerateTarget`.

use crate::domain::Evaluation;
use crate::error::FailureReason;
use crate::models::ModelKind;

/// Score `kind(params, x)` against `(xs, ys)`.
pub fn evaluate(
    kind: ModelKind,
    params: &[f64],
    xs: &[f64],
    ys: &[f64],
) -> Result<Evaluation, FailureReason> {
    let predictions: Vec<f64> = xs.iter().map(|&x| kind.predict(params, x)).collect();
    score(&predictions, ys)
}

/// Score precomputed predictions against targets.
pub fn score(predictions: &[f64], ys: &[f64]) -> Result<Evaluation, FailureReason> {
    if ys.is_empty() || predictions.len() != ys.len() {
        return Err(FailureReason::DegenerateTarget);
    }
    if predictions.iter().any(|v| !v.is_finite()) {
        return Err(FailureReason::NonFiniteResult);
    }

    let ss_res = sse(predictions, ys);
    let rmse = (ss_res / ys.len() as f64).sqrt();

    let ss_tot = total_sum_of_squares(ys);
    if ss_tot == 0.0 {
        return Err(FailureReason::DegenerateTarget);
    }

    Ok(Evaluation {
        r_squared: 1.0 - ss_res / ss_tot,
        rmse,
    })
}

/// RMSE only; defined even for a constant target.
pub fn rmse(predictions: &[f64], ys: &[f64]) -> Option<f64> {
    if ys.is_empty() || predictions.len() != ys.len() {
        return None;
    }
    let value = (sse(predictions, ys) / ys.len() as f64).sqrt();
    value.is_finite().then_some(value)
}

fn sse(predictions: &[f64], ys: &[f64]) -> f64 {
    predictions
        .iter()
        .zip(ys.iter())
        .map(|(&p, &y)| (y - p).powi(2))
        .sum()
}

fn total_sum_of_squares(ys: &[f64]) -> f64 {
    let mean = ys.iter().sum::<f64>() / ys.len() as f64;
    ys.iter().map(|&y| (y - mean).powi(2)).sum()
}
