//! Reporting utilities: residuals, plot series and formatted terminal output.

pub mod format;

pub use format::*;

use crate::domain::{CalibrationReport, FitResult, Observation, PlotSeries};
use crate::error::AppError;

/// Per-observation fit of the selected model.
#[derive(Debug, Clone, PartialEq)]
pub struct PointResidual {
    pub point: Observation,
    pub y_fit: f64,
    pub residual: f64,
    /// Whether this observation was one of the calibration points.
    pub in_calibration: bool,
}

/// Compute fitted values and residuals for each observation.
pub fn compute_residuals(
    points: &[Observation],
    report: &CalibrationReport,
) -> Result<Vec<PointResidual>, AppError> {
    let mut calibration = report.calibration_points.clone();
    let mut out = Vec::with_capacity(points.len());
    for p in points {
        let y_fit = report.selected.predict(p.x);
        if !y_fit.is_finite() {
            return Err(AppError::new(4, "Non-finite model prediction during residual computation."));
        }
        // Each calibration point marks one matching observation.
        let in_calibration = match calibration.iter().position(|c| c == p) {
            Some(idx) => {
                calibration.swap_remove(idx);
                true
            }
            None => false,
        };
        out.push(PointResidual {
            point: *p,
            y_fit,
            residual: p.y - y_fit,
            in_calibration,
        });
    }
    Ok(out)
}

/// Build the data a plotting front-end needs: raw points, calibration points
/// and the selected model on `grid_points` evenly spaced x values.
pub fn plot_series(points: &[Observation], report: &CalibrationReport, grid_points: usize) -> PlotSeries {
    let (grid_x, grid_y) = build_grid(&report.selected, points, grid_points);
    PlotSeries {
        dataset: points.to_vec(),
        calibration_points: report.calibration_points.clone(),
        grid_x,
        grid_y,
    }
}

fn build_grid(fit: &FitResult, points: &[Observation], n: usize) -> (Vec<f64>, Vec<f64>) {
    let n = n.max(2);
    let x0 = points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
    let x1 = points.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
    if !(x0.is_finite() && x1.is_finite()) {
        return (Vec::new(), Vec::new());
    }

    let mut xs = Vec::with_capacity(n);
    let mut ys = Vec::with_capacity(n);
    for i in 0..n {
        let u = i as f64 / (n as f64 - 1.0);
        let x = x0 + u * (x1 - x0);
        xs.push(x);
        ys.push(fit.predict(x));
    }
    (xs, ys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ModelKind;

    fn report(calibration: Vec<Observation>) -> CalibrationReport {
        CalibrationReport {
            selected: FitResult {
                model_name: "Linear".to_string(),
                kind: ModelKind::Linear,
                params: vec![2.0, 0.0],
                r_squared: 1.0,
                rmse: 0.0,
                n: calibration.len(),
            },
            full_dataset_rmse: 0.0,
            full_dataset_r_squared: Some(1.0),
            calibration_points: calibration,
            attempts: Vec::new(),
            dataset_len: 3,
        }
    }

    #[test]
    fn compute_residuals_marks_calibration_points() {
        let points = vec![
            Observation::new(1.0, 2.0),
            Observation::new(2.0, 5.0),
            Observation::new(3.0, 6.0),
        ];
        let report = report(vec![points[0], points[2]]);
        let residuals = compute_residuals(&points, &report).unwrap();
        assert_eq!(residuals.len(), 3);
        assert!((residuals[1].residual - 1.0).abs() < 1e-12);
        let flags: Vec<bool> = residuals.iter().map(|r| r.in_calibration).collect();
        assert_eq!(flags, [true, false, true]);
    }

    #[test]
    fn plot_grid_spans_full_x_range() {
        let points = vec![
            Observation::new(4.0, 8.0),
            Observation::new(-1.0, -2.0),
            Observation::new(2.0, 4.0),
        ];
        let series = plot_series(&points, &report(vec![points[1], points[0]]), 11);
        assert_eq!(series.grid_x.len(), 11);
        assert_eq!(series.grid_x[0], -1.0);
        assert_eq!(series.grid_x[10], 4.0);
        assert!((series.grid_y[10] - 8.0).abs() < 1e-12);
        assert_eq!(series.dataset.len(), 3);
        assert_eq!(series.calibration_points.len(), 2);
    }
}
