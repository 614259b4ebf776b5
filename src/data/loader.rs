use std::collections::HashSet;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, Float32Array, Float64Array, Int32Array, Int64Array};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;
use thiserror::Error;

use super::model::{Column, Dataset, Record};

/// The reference dataset, compiled into the binary.
const BUNDLED_CSV: &str = include_str!("../../assets/iris.csv");

// ---------------------------------------------------------------------------
// Errors the caller reports with a dedicated message
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("dataset file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("dataset file is empty: {}", .0.display())]
    Empty(PathBuf),
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Parse the embedded reference dataset.
pub fn load_bundled() -> Result<Dataset> {
    let records = parse_csv(BUNDLED_CSV.as_bytes()).context("parsing bundled dataset")?;
    Dataset::from_records(&records)
}

/// Load a dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with the column names, empty cell = missing
/// * `.json`    – `[{ "sepal length (cm)": 5.1, ..., "target": 0 }, ...]`
/// * `.parquet` – one flat column per field, nulls allowed
///
/// NaN cells count as missing. A `target` that is not a whole number
/// (`1.7`, `NaN`) is missing too; `0.0` reads as class 0. The `species`
/// column is always derived from `target`, never read.
pub fn load_file(path: &Path) -> Result<Dataset> {
    match std::fs::metadata(path) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            bail!(LoadError::NotFound(path.to_path_buf()))
        }
        Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
        Ok(meta) if meta.len() == 0 => bail!(LoadError::Empty(path.to_path_buf())),
        Ok(_) => {}
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let records = match ext.as_str() {
        "csv" => load_csv(path)?,
        "json" => load_json(path)?,
        "parquet" | "pq" => load_parquet(path)?,
        other => bail!("Unsupported file extension: .{other}"),
    };

    if records.is_empty() {
        bail!(LoadError::Empty(path.to_path_buf()));
    }
    log::info!("Loaded {} records from {}", records.len(), path.display());
    Dataset::from_records(&records)
}

// ---------------------------------------------------------------------------
// Row schema shared by the CSV and JSON loaders
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "sepal length (cm)")]
    sepal_length: Option<f64>,
    #[serde(rename = "sepal width (cm)")]
    sepal_width: Option<f64>,
    #[serde(rename = "petal length (cm)")]
    petal_length: Option<f64>,
    #[serde(rename = "petal width (cm)")]
    petal_width: Option<f64>,
    target: Option<f64>,
}

impl RawRow {
    fn into_record(self, index: usize) -> Record {
        Record::new(
            index,
            [
                present(self.sepal_length),
                present(self.sepal_width),
                present(self.petal_length),
                present(self.petal_width),
            ],
            class_index(self.target, index),
        )
    }
}

/// NaN is a missing cell.
fn present(value: Option<f64>) -> Option<f64> {
    value.filter(|v| !v.is_nan())
}

/// A class index must be a finite whole number; anything else is missing.
fn class_index(value: Option<f64>, row: usize) -> Option<i64> {
    let value = present(value)?;
    if value.is_finite() && value.fract() == 0.0 {
        Some(value as i64)
    } else {
        log::warn!("Row {row}: target {value} is not a class index, treating as missing");
        None
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<Vec<Record>> {
    let text = std::fs::read_to_string(path).context("reading CSV file")?;
    if text.trim().is_empty() {
        bail!(LoadError::Empty(path.to_path_buf()));
    }
    parse_csv(text.as_bytes())
}

fn parse_csv<R: Read>(source: R) -> Result<Vec<Record>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(source);

    let headers = reader.headers().context("reading CSV header")?.clone();
    for col in Column::NUMERIC {
        if !headers.iter().any(|h| h == col.name()) {
            bail!("CSV missing '{col}' column");
        }
    }

    reader
        .deserialize::<RawRow>()
        .enumerate()
        .map(|(row_no, result)| {
            result
                .map(|raw| raw.into_record(row_no))
                .with_context(|| format!("CSV row {row_no}"))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, the default `to_json(orient='records')` layout.
/// `null` or an absent key marks a missing cell, but every column must
/// appear in at least one record.
fn load_json(path: &Path) -> Result<Vec<Record>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    if text.trim().is_empty() {
        bail!(LoadError::Empty(path.to_path_buf()));
    }
    let value: serde_json::Value = serde_json::from_str(&text).context("parsing JSON")?;

    if let Some(items) = value.as_array().filter(|items| !items.is_empty()) {
        let keys: HashSet<&str> = items
            .iter()
            .filter_map(|item| item.as_object())
            .flat_map(|obj| obj.keys().map(String::as_str))
            .collect();
        for col in Column::NUMERIC {
            if !keys.contains(col.name()) {
                bail!("JSON records missing '{col}' key");
            }
        }
    }
    let rows: Vec<RawRow> = serde_json::from_value(value).context("parsing JSON records")?;

    Ok(rows
        .into_iter()
        .enumerate()
        .map(|(i, raw)| raw.into_record(i))
        .collect())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one flat column per field.
///
/// Measurement columns may be Float64, Float32, Int64 or Int32; `target`
/// may be Int64, Int32 or an integral float. Works with files written by
/// both Pandas and Polars.
fn load_parquet(path: &Path) -> Result<Vec<Record>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let mut columns = Vec::with_capacity(Column::NUMERIC.len());
        for col in Column::NUMERIC {
            let idx = schema
                .index_of(col.name())
                .map_err(|_| anyhow::anyhow!("Parquet file missing '{col}' column"))?;
            columns.push(batch.column(idx));
        }

        for row in 0..batch.num_rows() {
            let mut measurements = [None; 4];
            for (slot, col) in measurements.iter_mut().zip(&columns) {
                *slot = extract_f64(col, row)
                    .with_context(|| format!("Row {}: unreadable measurement", records.len()))?;
            }
            let target = extract_f64(columns[4], row)
                .with_context(|| format!("Row {}: unreadable 'target'", records.len()))?;
            let target = class_index(target, records.len());

            records.push(Record::new(records.len(), measurements, target));
        }
    }

    Ok(records)
}

// -- Parquet / Arrow helpers --

/// Read one numeric cell as `f64`. Nulls and NaN become `None`.
fn extract_f64(col: &Arc<dyn Array>, row: usize) -> Result<Option<f64>> {
    if col.is_null(row) {
        return Ok(None);
    }
    let value = match col.data_type() {
        DataType::Float64 => downcast::<Float64Array>(col)?.value(row),
        DataType::Float32 => downcast::<Float32Array>(col)?.value(row) as f64,
        DataType::Int64 => downcast::<Int64Array>(col)?.value(row) as f64,
        DataType::Int32 => downcast::<Int32Array>(col)?.value(row) as f64,
        other => bail!("Expected a numeric column, got {other:?}"),
    };
    Ok(present(Some(value)))
}

fn downcast<T: Array + 'static>(col: &Arc<dyn Array>) -> Result<&T> {
    col.as_any()
        .downcast_ref::<T>()
        .with_context(|| format!("column type {:?} does not match its array", col.data_type()))
}
