//! Reader for the fixed-schema diabetes table (CSV or TSV).
use std::path::Path;

use csv::StringRecord;

use crate::data_handling::{Dataset, FEATURE_NAMES, N_FEATURES, OUTCOME_COLUMN};
use crate::error::{PipelineError, Result};
use crate::math::Array2;

/// Read a diabetes dataset; the delimiter is chosen from the file extension.
///
/// The header must hold exactly the eight feature columns plus `Outcome`,
/// in any order. Values must be numeric and finite; no imputation is done.
pub fn read_dataset<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(PipelineError::data_load(path, "file does not exist"));
    }

    let is_tsv = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("tsv"))
        .unwrap_or(false);
    let delimiter = if is_tsv { b'\t' } else { b',' };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| PipelineError::data_load(path, format!("failed to open: {}", e)))?;

    let headers = reader
        .headers()
        .map_err(|e| PipelineError::data_load(path, format!("failed to read header row: {}", e)))?
        .clone();

    let (feature_idx, outcome_idx) = resolve_columns(&headers).map_err(|r| PipelineError::data_load(path, r))?;

    let mut values = Vec::new();
    let mut labels = Vec::new();

    for (row_idx, result) in reader.records().enumerate() {
        // +2: one for the header, one for 1-based line numbers
        let line = row_idx + 2;
        let record = result
            .map_err(|e| PipelineError::data_load(path, format!("failed to read line {}: {}", line, e)))?;

        for (&col, name) in feature_idx.iter().zip(FEATURE_NAMES.iter()) {
            let value = parse_cell(&record, col)
                .map_err(|r| PipelineError::data_load(path, format!("line {}, column {}: {}", line, name, r)))?;
            values.push(value);
        }

        let outcome = parse_cell(&record, outcome_idx).map_err(|r| {
            PipelineError::data_load(path, format!("line {}, column {}: {}", line, OUTCOME_COLUMN, r))
        })?;
        let label = match outcome {
            v if v == 0.0 => 0u8,
            v if v == 1.0 => 1u8,
            v => {
                return Err(PipelineError::data_load(
                    path,
                    format!("line {}: outcome must be 0 or 1, got {}", line, v),
                ))
            }
        };
        labels.push(label);
    }

    if labels.is_empty() {
        return Err(PipelineError::data_load(path, "no data rows"));
    }

    let x = Array2::from_shape_vec((labels.len(), N_FEATURES), values)
        .map_err(|e| PipelineError::data_load(path, e.to_string()))?;
    let dataset = Dataset::new(x, labels)?;
    log::debug!("Read {} samples from {}", dataset.len(), path.display());
    Ok(dataset)
}

/// Map each canonical feature (and the outcome) to its position in the header.
fn resolve_columns(headers: &StringRecord) -> std::result::Result<([usize; N_FEATURES], usize), String> {
    if headers.len() != N_FEATURES + 1 {
        return Err(format!(
            "expected {} columns ({} + {}), found {}: {:?}",
            N_FEATURES + 1,
            FEATURE_NAMES.join(", "),
            OUTCOME_COLUMN,
            headers.len(),
            headers.iter().collect::<Vec<_>>()
        ));
    }

    let mut feature_idx = [0usize; N_FEATURES];
    for (slot, name) in feature_idx.iter_mut().zip(FEATURE_NAMES.iter()) {
        *slot = find_column(headers, name).ok_or_else(|| format!("missing column '{}'", name))?;
    }
    let outcome_idx =
        find_column(headers, OUTCOME_COLUMN).ok_or_else(|| format!("missing column '{}'", OUTCOME_COLUMN))?;
    Ok((feature_idx, outcome_idx))
}

fn find_column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}

fn parse_cell(record: &StringRecord, idx: usize) -> std::result::Result<f64, String> {
    let raw = record.get(idx).unwrap_or("").trim();
    if raw.is_empty() {
        return Err("missing value".to_string());
    }
    let value: f64 = raw.parse().map_err(|_| format!("non-numeric value '{}'", raw))?;
    if !value.is_finite() {
        return Err(format!("non-finite value '{}'", raw));
    }
    Ok(value)
}
