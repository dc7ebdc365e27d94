//! Shared domain types.
//!
//! These types are kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting and selection
//! - exported to JSON/CSV by the caller
//! - printed by the terminal report

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FitFailure;
use crate::models::ModelKind;

/// One paired reading: raw sensor value `x` and reference force `y`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub x: f64,
    pub y: f64,
}

impl Observation {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Split a dataset into separate x and y vectors.
pub fn unzip(points: &[Observation]) -> (Vec<f64>, Vec<f64>) {
    points.iter().map(|p| (p.x, p.y)).unzip()
}

/// Goodness-of-fit of one model on one dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub r_squared: f64,
    pub rmse: f64,
}

/// A successfully fitted model, scored on the data it was fitted to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    pub model_name: String,
    pub kind: ModelKind,
    pub params: Vec<f64>,
    pub r_squared: f64,
    pub rmse: f64,
    /// Number of points the model was fitted and scored on.
    pub n: usize,
}

impl FitResult {
    /// Evaluate the fitted function at `x`.
    pub fn predict(&self, x: f64) -> f64 {
        self.kind.predict(&self.params, x)
    }
}

/// Outcome of one registry entry during a calibration run.
pub type ModelAttempt = Result<FitResult, FitFailure>;

/// Final output of a calibration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationReport {
    /// Winning model, scored on the calibration subset.
    pub selected: FitResult,
    /// RMSE of the winning model on the full dataset.
    pub full_dataset_rmse: f64,
    /// R² on the full dataset (`None` when the full target has zero variance).
    pub full_dataset_r_squared: Option<f64>,
    /// Points the models were fitted on (ascending x).
    pub calibration_points: Vec<Observation>,
    /// Every attempted model, in registry order.
    pub attempts: Vec<ModelAttempt>,
    pub dataset_len: usize,
}

impl CalibrationReport {
    pub fn successes(&self) -> impl Iterator<Item = &FitResult> {
        self.attempts.iter().filter_map(|a| a.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &FitFailure> {
        self.attempts.iter().filter_map(|a| a.as_ref().err())
    }
}

/// Summary stats about a loaded dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetStats {
    pub n_points: usize,
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

/// Compute dataset stats, or `None` for an empty dataset.
pub fn compute_stats(points: &[Observation]) -> Option<DatasetStats> {
    let first = points.first()?;
    let mut stats = DatasetStats {
        n_points: points.len(),
        x_min: first.x,
        x_max: first.x,
        y_min: first.y,
        y_max: first.y,
    };
    for p in &points[1..] {
        stats.x_min = stats.x_min.min(p.x);
        stats.x_max = stats.x_max.max(p.x);
        stats.y_min = stats.y_min.min(p.y);
        stats.y_max = stats.y_max.max(p.y);
    }
    Some(stats)
}

/// Column selector for the input CSV: a header name or a zero-based index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRef {
    Index(usize),
    Name(String),
}

impl std::str::FromStr for ColumnRef {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(match s.parse::<usize>() {
            Ok(idx) => ColumnRef::Index(idx),
            Err(_) => ColumnRef::Name(s.to_string()),
        })
    }
}

impl std::fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnRef::Index(idx) => write!(f, "#{idx}"),
            ColumnRef::Name(name) => write!(f, "`{name}`"),
        }
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags, environment (`FCAL_*`, `.env`) and defaults.
#[derive(Debug, Clone)]
pub struct CalibConfig {
    pub csv_path: PathBuf,
    pub x_col: ColumnRef,
    pub y_col: ColumnRef,
    /// Number of calibration points drawn from the dataset.
    pub points: usize,
    /// Restrict the catalogue to these model names (registry order kept).
    pub models: Option<Vec<String>>,
    pub max_iterations: usize,
    pub parallel: bool,

    pub export_report: Option<PathBuf>,
    pub export_predictions: Option<PathBuf>,
    /// Number of grid points for the exported plot series.
    pub grid_points: usize,
}

/// Evenly spaced evaluation of the selected model (for plotting front-ends).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotSeries {
    pub dataset: Vec<Observation>,
    pub calibration_points: Vec<Observation>,
    pub grid_x: Vec<f64>,
    pub grid_y: Vec<f64>,
}

/// A saved calibration report (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportFile {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub source: PathBuf,
    pub stats: DatasetStats,
    pub model_name: String,
    pub params: Vec<f64>,
    pub r_squared: f64,
    pub calibration_rmse: f64,
    pub full_dataset_rmse: f64,
    pub full_dataset_r_squared: Option<f64>,
    pub failures: Vec<FitFailure>,
    pub plot: PlotSeries,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_ref_parses_index_or_name() {
        assert_eq!("2".parse::<ColumnRef>().unwrap(), ColumnRef::Index(2));
        assert_eq!(
            " Force ".parse::<ColumnRef>().unwrap(),
            ColumnRef::Name("Force".to_string())
        );
    }

    #[test]
    fn compute_stats_tracks_ranges() {
        let points = vec![
            Observation::new(3.0, -1.0),
            Observation::new(1.0, 4.0),
            Observation::new(2.0, 0.5),
        ];
        let stats = compute_stats(&points).unwrap();
        assert_eq!(stats.n_points, 3);
        assert_eq!(stats.x_min, 1.0);
        assert_eq!(stats.x_max, 3.0);
        assert_eq!(stats.y_min, -1.0);
        assert_eq!(stats.y_max, 4.0);
        assert!(compute_stats(&[]).is_none());
    }
}
