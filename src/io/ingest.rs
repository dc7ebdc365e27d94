//! CSV ingest and validation.
//!
//! Turns a calibration export (one row per reading) into a clean list of
//! `(x, y)` observations that are safe to fit.
//!
//! Design goals:
//! - **Strict schema**: at least two columns, x/y resolvable (exit code 2)
//! - **Row-level validation**: skip bad rows, but report what happened
//! - **Deterministic behavior**: rows keep file order
//! - **Separation of concerns**: no fitting logic here

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::domain::{ColumnRef, DatasetStats, Observation, compute_stats};
use crate::error::{AppError, CalibError};

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: observations + stats + row errors.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub points: Vec<Observation>,
    pub x_name: String,
    pub y_name: String,
    pub stats: DatasetStats,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Load a dataset from a CSV file.
pub fn load_dataset(path: &Path, x_col: &ColumnRef, y_col: &ColumnRef) -> Result<IngestedData, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    read_dataset(file, x_col, y_col)
}

/// Load a dataset from any CSV reader (header row required).
pub fn read_dataset<R: Read>(reader: R, x_col: &ColumnRef, y_col: &ColumnRef) -> Result<IngestedData, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();

    if headers.len() < 2 {
        return Err(CalibError::InsufficientColumns { found: headers.len() }.into());
    }

    let header_map = build_header_map(&headers);
    let x_idx = resolve_column(x_col, &header_map, headers.len())?;
    let y_idx = resolve_column(y_col, &header_map, headers.len())?;
    if x_idx == y_idx {
        return Err(AppError::new(
            2,
            format!("x and y refer to the same column ({x_col})."),
        ));
    }

    let mut points = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: records start after the header, lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        if record.iter().all(|field| field.is_empty()) {
            continue;
        }

        match parse_row(&record, x_idx, y_idx) {
            Ok(p) => points.push(p),
            Err(message) => {
                log::warn!("line {line}: {message}");
                row_errors.push(RowError { line, message });
            }
        }
    }

    if points.len() < 2 {
        return Err(AppError::new(
            3,
            format!(
                "Need at least 2 valid rows, found {} (of {rows_read} read).",
                points.len()
            ),
        ));
    }

    let stats = compute_stats(&points)
        .ok_or_else(|| AppError::new(3, "No valid points remain after validation."))?;

    Ok(IngestedData {
        points,
        x_name: headers[x_idx].trim_start_matches('\u{feff}').to_string(),
        y_name: headers[y_idx].trim_start_matches('\u{feff}').to_string(),
        stats,
        row_errors,
        rows_read,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    let mut map = HashMap::new();
    for (idx, name) in headers.iter().enumerate() {
        // First occurrence wins for duplicate headers.
        map.entry(normalize_header_name(name)).or_insert(idx);
    }
    map
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header. If we don't strip it, `--x-col` lookups fail.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn resolve_column(col: &ColumnRef, header_map: &HashMap<String, usize>, width: usize) -> Result<usize, AppError> {
    match col {
        ColumnRef::Index(idx) if *idx < width => Ok(*idx),
        ColumnRef::Index(idx) => Err(AppError::new(
            2,
            format!("Column index {idx} out of range (file has {width} columns)."),
        )),
        ColumnRef::Name(name) => header_map
            .get(&normalize_header_name(name))
            .copied()
            .ok_or_else(|| AppError::new(2, format!("Missing column: `{name}`"))),
    }
}

fn parse_row(record: &StringRecord, x_idx: usize, y_idx: usize) -> Result<Observation, String> {
    let x = parse_f64(record.get(x_idx)).ok_or_else(|| "Missing/invalid x value.".to_string())?;
    let y = parse_f64(record.get(y_idx)).ok_or_else(|| "Missing/invalid y value.".to_string())?;
    Ok(Observation::new(x, y))
}

fn parse_f64(field: Option<&str>) -> Option<f64> {
    let v: f64 = field?.trim().parse().ok()?;
    v.is_finite().then_some(v)
}
