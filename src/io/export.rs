//! Export calibration results.
//!
//! - report JSON: selected model, diagnostics and a plot series
//! - predictions CSV: one row per observation, easy to consume in spreadsheets

use std::fs::File;
use std::path::Path;

use chrono::Utc;

use crate::domain::{CalibrationReport, Observation, ReportFile};
use crate::error::AppError;
use crate::io::ingest::IngestedData;
use crate::report::{compute_residuals, plot_series};

/// Build the serializable report for a finished run.
pub fn build_report_file(
    report: &CalibrationReport,
    ingest: &IngestedData,
    source: &Path,
    grid_points: usize,
) -> ReportFile {
    let selected = &report.selected;
    ReportFile {
        tool: "fcal".to_string(),
        generated_at: Utc::now(),
        source: source.to_path_buf(),
        stats: ingest.stats.clone(),
        model_name: selected.model_name.clone(),
        params: selected.params.clone(),
        r_squared: selected.r_squared,
        calibration_rmse: selected.rmse,
        full_dataset_rmse: report.full_dataset_rmse,
        full_dataset_r_squared: report.full_dataset_r_squared,
        failures: report.failures().cloned().collect(),
        plot: plot_series(&ingest.points, report, grid_points),
    }
}

/// Write the report JSON file.
pub fn write_report_json(
    path: &Path,
    report: &CalibrationReport,
    ingest: &IngestedData,
    source: &Path,
    grid_points: usize,
) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create report JSON '{}': {e}", path.display())))?;

    let out = build_report_file(report, ingest, source, grid_points);
    serde_json::to_writer_pretty(file, &out)
        .map_err(|e| AppError::new(2, format!("Failed to write report JSON: {e}")))?;

    log::info!("Wrote report to {}", path.display());
    Ok(())
}

/// Write fitted values and residuals for every observation to CSV.
pub fn write_predictions_csv(
    path: &Path,
    points: &[Observation],
    report: &CalibrationReport,
) -> Result<(), AppError> {
    let residuals = compute_residuals(points, report)?;
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::new(2, format!("Failed to create predictions CSV '{}': {e}", path.display())))?;

    writer
        .write_record(["x", "y", "y_fit", "residual", "in_calibration"])
        .map_err(|e| AppError::new(2, format!("Failed to write predictions CSV header: {e}")))?;

    for r in &residuals {
        writer
            .write_record([
                r.point.x.to_string(),
                r.point.y.to_string(),
                format!("{:.10}", r.y_fit),
                format!("{:.10}", r.residual),
                r.in_calibration.to_string(),
            ])
            .map_err(|e| AppError::new(2, format!("Failed to write predictions CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush predictions CSV: {e}")))?;

    log::info!("Wrote {} prediction row(s) to {}", residuals.len(), path.display());
    Ok(())
}
