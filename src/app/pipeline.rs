//! Shared calibration pipeline.
//!
//! CSV ingest -> registry -> point selection + fits -> model selection
//!
//! Front-ends can then focus on presentation (printing vs exports).

use crate::domain::{CalibConfig, CalibrationReport};
use crate::error::AppError;
use crate::fit::{CalibrationOptions, FitOptions, run_calibration};
use crate::io::ingest::{IngestedData, load_dataset};
use crate::models::ModelRegistry;

/// All computed outputs of a single `fcal calibrate` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub ingest: IngestedData,
    pub registry: ModelRegistry,
    pub report: CalibrationReport,
}

/// Execute the full calibration pipeline and return the computed outputs.
pub fn run_calibrate(config: &CalibConfig) -> Result<RunOutput, AppError> {
    let ingest = load_dataset(&config.csv_path, &config.x_col, &config.y_col)?;
    log::info!(
        "Loaded {} point(s) from {} ({} row error(s)).",
        ingest.points.len(),
        config.csv_path.display(),
        ingest.row_errors.len()
    );

    run_calibrate_with_data(config, ingest)
}

/// Execute the pipeline on already-ingested data.
pub fn run_calibrate_with_data(config: &CalibConfig, ingest: IngestedData) -> Result<RunOutput, AppError> {
    let registry = build_registry(config.models.as_deref())?;
    let opts = CalibrationOptions {
        fit: FitOptions {
            max_iterations: config.max_iterations,
        },
        parallel: config.parallel,
    };

    let report = run_calibration(&ingest.points, config.points, &registry, &opts)?;

    Ok(RunOutput {
        ingest,
        registry,
        report,
    })
}

/// The standard catalogue, optionally restricted to `models`.
pub fn build_registry(models: Option<&[String]>) -> Result<ModelRegistry, AppError> {
    let registry = ModelRegistry::standard();
    match models {
        Some(names) => Ok(registry.only(names)?),
        None => Ok(registry),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ColumnRef, Observation, compute_stats};
    use std::path::PathBuf;

    fn config(points: usize, models: Option<Vec<String>>) -> CalibConfig {
        CalibConfig {
            csv_path: PathBuf::from("memory.csv"),
            x_col: ColumnRef::Index(0),
            y_col: ColumnRef::Index(1),
            points,
            models,
            max_iterations: 400,
            parallel: false,
            export_report: None,
            export_predictions: None,
            grid_points: 101,
        }
    }

    fn ingest(points: Vec<Observation>) -> IngestedData {
        IngestedData {
            stats: compute_stats(&points).unwrap(),
            rows_read: points.len(),
            points,
            x_name: "x".to_string(),
            y_name: "y".to_string(),
            row_errors: Vec::new(),
        }
    }

    #[test]
    fn model_filter_restricts_attempts() {
        let points: Vec<Observation> = (1..=8).map(|i| Observation::new(i as f64, 0.5 * i as f64 + 3.0)).collect();
        let cfg = config(4, Some(vec!["power".to_string(), "Linear".to_string()]));
        let run = run_calibrate_with_data(&cfg, ingest(points)).unwrap();
        assert_eq!(run.registry.len(), 2);
        assert_eq!(run.report.attempts.len(), 2);
        assert_eq!(run.report.selected.model_name, "Linear");
    }

    #[test]
    fn errors_map_to_exit_codes() {
        let points: Vec<Observation> = (1..=4).map(|i| Observation::new(i as f64, i as f64)).collect();

        let unknown = config(3, Some(vec!["Spline".to_string()]));
        assert_eq!(run_calibrate_with_data(&unknown, ingest(points.clone())).unwrap_err().exit_code(), 2);

        let too_many = config(9, None);
        assert_eq!(run_calibrate_with_data(&too_many, ingest(points.clone())).unwrap_err().exit_code(), 2);

        let negative: Vec<Observation> = points.iter().map(|p| Observation::new(-p.x, p.y)).collect();
        let domain_only = config(3, Some(vec!["Logarithmic".to_string()]));
        assert_eq!(run_calibrate_with_data(&domain_only, ingest(negative)).unwrap_err().exit_code(), 3);
    }
}
