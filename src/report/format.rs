//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized

use crate::domain::{CalibConfig, CalibrationReport, FitResult, ModelAttempt};
use crate::io::ingest::IngestedData;

/// Format the full run summary (dataset stats + per-model diagnostics + chosen model).
pub fn format_run_summary(ingest: &IngestedData, report: &CalibrationReport, config: &CalibConfig) -> String {
    let mut out = String::new();

    out.push_str("=== fcal - Force Sensor Calibration ===\n");
    out.push_str(&format!("Source: {}\n", config.csv_path.display()));
    out.push_str(&format!(
        "Columns: x={} | y={}\n",
        ingest.x_name, ingest.y_name
    ));
    out.push_str(&format!(
        "Points: n={} | x=[{:.4}, {:.4}] | y=[{:.4}, {:.4}]\n",
        ingest.stats.n_points,
        ingest.stats.x_min,
        ingest.stats.x_max,
        ingest.stats.y_min,
        ingest.stats.y_max
    ));
    if !ingest.row_errors.is_empty() {
        out.push_str(&format!(
            "Skipped rows: {} of {} (first at line {})\n",
            ingest.row_errors.len(),
            ingest.rows_read,
            ingest.row_errors[0].line
        ));
    }
    out.push_str(&format!(
        "Calibration points: {} (requested {})\n",
        report.calibration_points.len(),
        config.points
    ));

    out.push_str("\nModel diagnostics (calibration subset):\n");
    out.push_str(&format_attempts(&report.attempts, &report.selected));

    out.push_str("\nChosen model:\n");
    out.push_str(&format_selected(report));
    out.push('\n');

    out
}

/// One line per attempted model; the winner is starred.
pub fn format_attempts(attempts: &[ModelAttempt], selected: &FitResult) -> String {
    let mut out = String::new();
    for attempt in attempts {
        let line = match attempt {
            Ok(fit) => {
                let chosen = if fit.model_name == selected.model_name { "*" } else { " " };
                format!(
                    "{chosen} {:<22} R²={:>12.8} RMSE={:.6}",
                    truncate(&fit.model_name, 22),
                    fit.r_squared,
                    fit.rmse
                )
            }
            Err(failure) => format!(
                "  {:<22} failed: {}",
                truncate(&failure.model_name, 22),
                failure.reason
            ),
        };
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

/// The final report block.
pub fn format_selected(report: &CalibrationReport) -> String {
    let fit = &report.selected;
    let mut out = String::new();
    out.push_str(&format!("- {} : y = {}\n", fit.model_name, fit.kind.formula()));
    out.push_str(&format!("- params: {}\n", fmt_vec(&fit.params)));
    out.push_str(&format!("- R² (calibration): {:.8}\n", fit.r_squared));
    out.push_str(&format!("- RMSE (calibration, n={}): {:.6}\n", fit.n, fit.rmse));
    out.push_str(&format!(
        "- RMSE (full dataset, n={}): {:.6}\n",
        report.dataset_len, report.full_dataset_rmse
    ));
    if let Some(r2) = report.full_dataset_r_squared {
        out.push_str(&format!("- R² (full dataset): {r2:.8}\n"));
    }
    out
}

fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.6e}")).collect();
    format!("[{}]", parts.join(", "))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
