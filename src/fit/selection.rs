//! Calibration run: point selection, per-model fits and model selection.
//!
//! For each registry entry (in order) we:
//! - fit the model on the calibration subset
//! - score it on the same subset (R², RMSE)
//! - keep it only if R² is a valid number `<= 1`
//!
//! Selection rules:
//! 1. Highest R² wins.
//! 2. Equal R²: the earlier registry entry wins.
//!
//! The winner is then re-scored on the full dataset.

use rayon::prelude::*;

use crate::domain::{CalibrationReport, FitResult, ModelAttempt, Observation, unzip};
use crate::error::{CalibError, FailureReason, FitFailure};
use crate::fit::evaluator::{evaluate, rmse, score};
use crate::fit::fitter::{FitOptions, fit_model};
use crate::fit::points::select_points;
use crate::models::{ModelRegistry, ModelSpec};

/// Slack for R² rounding just above 1 on exact fits.
const R_SQUARED_SLACK: f64 = 1e-12;

/// Options for a calibration run.
#[derive(Debug, Clone, Copy, Default)]
pub struct CalibrationOptions {
    pub fit: FitOptions,
    /// Fit registry entries concurrently (same result as sequential).
    pub parallel: bool,
}

/// Run the full calibration pipeline on `dataset` with `n` calibration points.
pub fn run_calibration(
    dataset: &[Observation],
    n: usize,
    registry: &ModelRegistry,
    opts: &CalibrationOptions,
) -> Result<CalibrationReport, CalibError> {
    let calibration_points = select_points(dataset, n)?;
    let (xs, ys) = unzip(&calibration_points);

    log::info!(
        "Selected {} calibration point(s) out of {} (requested {n}).",
        calibration_points.len(),
        dataset.len()
    );

    let attempts: Vec<ModelAttempt> = if opts.parallel {
        registry
            .specs()
            .par_iter()
            .map(|spec| attempt_model(spec, &xs, &ys, &opts.fit))
            .collect()
    } else {
        registry
            .specs()
            .iter()
            .map(|spec| attempt_model(spec, &xs, &ys, &opts.fit))
            .collect()
    };

    for attempt in &attempts {
        match attempt {
            Ok(fit) => log::info!(
                "{}: R²={:.6} RMSE={:.6}",
                fit.model_name,
                fit.r_squared,
                fit.rmse
            ),
            Err(failure) => log::warn!("Skipping {failure}"),
        }
    }

    let best = select_best(&attempts).cloned();
    let Some(selected) = best else {
        return Err(CalibError::NoModelConverged {
            failures: attempts.into_iter().filter_map(Result::err).collect(),
        });
    };

    let (full_x, full_y) = unzip(dataset);
    let predictions: Vec<f64> = full_x.iter().map(|&x| selected.predict(x)).collect();
    let full_dataset_rmse = rmse(&predictions, &full_y).ok_or_else(|| {
        CalibError::NonFiniteFullDataset {
            model_name: selected.model_name.clone(),
        }
    })?;
    let full_dataset_r_squared = score(&predictions, &full_y).ok().map(|e| e.r_squared);

    log::info!(
        "Selected {} (R²={:.6}); full-dataset RMSE={:.6}",
        selected.model_name,
        selected.r_squared,
        full_dataset_rmse
    );

    Ok(CalibrationReport {
        selected,
        full_dataset_rmse,
        full_dataset_r_squared,
        calibration_points,
        attempts,
        dataset_len: dataset.len(),
    })
}

/// Fit and score one model on the calibration subset.
pub fn attempt_model(spec: &ModelSpec, xs: &[f64], ys: &[f64], opts: &FitOptions) -> ModelAttempt {
    let params = fit_model(spec, xs, ys, opts)?;
    let eval = evaluate(spec.kind, &params, xs, ys)
        .map_err(|reason| FitFailure::new(spec.name.clone(), reason))?;

    if eval.r_squared.is_nan() || eval.r_squared > 1.0 + R_SQUARED_SLACK {
        return Err(FitFailure::new(spec.name.clone(), FailureReason::InvalidRSquared));
    }

    Ok(FitResult {
        model_name: spec.name.clone(),
        kind: spec.kind,
        params,
        r_squared: eval.r_squared.min(1.0),
        rmse: eval.rmse,
        n: xs.len(),
    })
}

/// Best successful attempt: highest R², ties to the earliest entry.
pub fn select_best(attempts: &[ModelAttempt]) -> Option<&FitResult> {
    attempts
        .iter()
        .enumerate()
        .filter_map(|(idx, a)| a.as_ref().ok().map(|fit| (idx, fit)))
        .reduce(pick_better)
        .map(|(_, fit)| fit)
}

/// Merge rule for `(registry index, fit)` pairs.
///
/// Commutative and associative, so it can merge results in any order.
pub fn pick_better<'a>(
    a: (usize, &'a FitResult),
    b: (usize, &'a FitResult),
) -> (usize, &'a FitResult) {
    if b.1.r_squared > a.1.r_squared || (b.1.r_squared == a.1.r_squared && b.0 < a.0) {
        b
    } else {
        a
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ModelKind;

    fn line_dataset() -> Vec<Observation> {
        [(1.0, 2.0), (2.0, 4.0), (3.0, 6.0), (4.0, 8.0), (5.0, 10.0)]
            .into_iter()
            .map(|(x, y)| Observation::new(x, y))
            .collect()
    }

    fn fit(name: &str, r_squared: f64) -> FitResult {
        FitResult {
            model_name: name.to_string(),
            kind: ModelKind::Linear,
            params: vec![1.0, 0.0],
            r_squared,
            rmse: 0.0,
            n: 3,
        }
    }

    #[test]
    fn end_to_end_line() {
        let data = line_dataset();
        let registry = ModelRegistry::standard();
        let report = run_calibration(&data, 3, &registry, &CalibrationOptions::default()).unwrap();

        let xs: Vec<f64> = report.calibration_points.iter().map(|p| p.x).collect();
        assert_eq!(xs, [1.0, 3.0, 5.0]);

        // Several polynomials fit a line exactly; Linear is listed first.
        assert_eq!(report.selected.model_name, "Linear");
        assert!((report.selected.params[0] - 2.0).abs() < 1e-6);
        assert!(report.selected.params[1].abs() < 1e-6);
        assert!((report.selected.r_squared - 1.0).abs() < 1e-9);
        assert!(report.full_dataset_rmse < 1e-6);
        assert_eq!(report.attempts.len(), registry.len());
        assert_eq!(report.dataset_len, 5);
    }

    #[test]
    fn linear_fit_on_noise_free_line_scores_one() {
        let data: Vec<Observation> = (0..12)
            .map(|i| {
                let x = 0.75 * i as f64 + 0.2;
                Observation::new(x, 3.0 * x + 5.0)
            })
            .collect();
        let registry = ModelRegistry::standard().only(&["Linear"]).unwrap();
        let report = run_calibration(&data, 6, &registry, &CalibrationOptions::default()).unwrap();
        assert!((report.selected.params[0] - 3.0).abs() < 1e-6);
        assert!((report.selected.params[1] - 5.0).abs() < 1e-6);
        assert!((report.selected.r_squared - 1.0).abs() < 1e-9);
    }

    #[test]
    fn invalid_point_count_produces_no_report() {
        let data = line_dataset();
        let registry = ModelRegistry::standard();
        for n in [0, 1, 6] {
            let err = run_calibration(&data, n, &registry, &CalibrationOptions::default()).unwrap_err();
            assert!(matches!(err, CalibError::InvalidParameterCount { .. }), "n={n}");
        }
    }

    #[test]
    fn all_failures_escalate_with_reasons() {
        let data: Vec<Observation> = (0..6)
            .map(|i| Observation::new(-(i as f64) - 1.0, i as f64 * 2.0))
            .collect();
        let registry = ModelRegistry::standard()
            .only(&["Logarithmic", "Power"])
            .unwrap();
        let err = run_calibration(&data, 4, &registry, &CalibrationOptions::default()).unwrap_err();
        let CalibError::NoModelConverged { failures } = err else {
            panic!("expected NoModelConverged, got {err:?}");
        };
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].model_name, "Logarithmic");
        assert_eq!(failures[1].model_name, "Power");
        assert!(failures.iter().all(|f| f.reason == FailureReason::DomainError));
    }

    #[test]
    fn constant_target_fails_every_model() {
        let data: Vec<Observation> = (1..=5).map(|i| Observation::new(i as f64, 7.0)).collect();
        let registry = ModelRegistry::standard().only(&["Linear", "Quadratic"]).unwrap();
        let err = run_calibration(&data, 3, &registry, &CalibrationOptions::default()).unwrap_err();
        let CalibError::NoModelConverged { failures } = err else {
            panic!("expected NoModelConverged");
        };
        assert!(failures.iter().all(|f| f.reason == FailureReason::DegenerateTarget));
    }

    #[test]
    fn two_points_leave_only_two_parameter_models() {
        let data: Vec<Observation> = [(1.0, 3.1), (2.0, 4.8), (3.0, 7.2), (4.0, 8.9), (5.0, 11.1), (6.0, 12.8)]
            .into_iter()
            .map(|(x, y)| Observation::new(x, y))
            .collect();
        let report = run_calibration(&data, 2, &ModelRegistry::standard(), &CalibrationOptions::default()).unwrap();

        let ok: Vec<&str> = report.successes().map(|f| f.model_name.as_str()).collect();
        assert_eq!(ok, ["Linear", "Exponential", "Logarithmic", "Power"]);
        let failed: Vec<&str> = report.failures().map(|f| f.model_name.as_str()).collect();
        assert_eq!(
            failed,
            ["Quadratic", "Cubic", "4th-degree polynomial", "Sinusoidal", "Cosinusoidal"]
        );
        assert!(report.failures().all(|f| f.reason == FailureReason::SingularJacobian));
    }

    #[test]
    fn equal_r_squared_prefers_earlier_registration() {
        let registry = ModelRegistry::new(vec![
            ModelSpec {
                kind: ModelKind::Linear,
                name: "Linear A".to_string(),
                initial_params: vec![1.0, 1.0],
            },
            ModelSpec {
                kind: ModelKind::Linear,
                name: "Linear B".to_string(),
                initial_params: vec![1.0, 1.0],
            },
        ])
        .unwrap();
        let data: Vec<Observation> = [(1.0, 1.2), (2.0, 1.9), (3.0, 3.4), (4.0, 3.8), (5.0, 5.3)]
            .into_iter()
            .map(|(x, y)| Observation::new(x, y))
            .collect();
        let report = run_calibration(&data, 5, &registry, &CalibrationOptions::default()).unwrap();
        let rs: Vec<f64> = report.successes().map(|f| f.r_squared).collect();
        assert_eq!(rs[0], rs[1]);
        assert_eq!(report.selected.model_name, "Linear A");
    }

    #[test]
    fn select_best_tie_break_and_failures() {
        let attempts: Vec<ModelAttempt> = vec![
            Err(FitFailure::new("Broken", FailureReason::NonConvergence)),
            Ok(fit("First", 0.9)),
            Ok(fit("Second", 0.95)),
            Ok(fit("Third", 0.95)),
        ];
        assert_eq!(select_best(&attempts).unwrap().model_name, "Second");

        let none: Vec<ModelAttempt> = vec![Err(FitFailure::new("Broken", FailureReason::DomainError))];
        assert!(select_best(&none).is_none());
    }

    #[test]
    fn pick_better_is_commutative_and_associative() {
        let fits = [fit("a", 0.5), fit("b", 0.8), fit("c", 0.8), fit("d", -1.0)];
        let items: Vec<(usize, &FitResult)> = fits.iter().enumerate().collect();
        for &x in &items {
            for &y in &items {
                assert_eq!(pick_better(x, y).0, pick_better(y, x).0);
                for &z in &items {
                    let left = pick_better(pick_better(x, y), z).0;
                    let right = pick_better(x, pick_better(y, z)).0;
                    assert_eq!(left, right);
                }
            }
        }
    }

    #[test]
    fn parallel_matches_sequential() {
        let data: Vec<Observation> = (1..=40)
            .map(|i| {
                let x = i as f64 * 12.5;
                Observation::new(x, 0.02 * x.powf(1.4) + (i % 3) as f64 * 0.05)
            })
            .collect();
        let registry = ModelRegistry::standard();
        let seq = run_calibration(&data, 15, &registry, &CalibrationOptions::default()).unwrap();
        let par_opts = CalibrationOptions {
            parallel: true,
            ..CalibrationOptions::default()
        };
        let par = run_calibration(&data, 15, &registry, &par_opts).unwrap();
        assert_eq!(seq, par);
    }
}
