//! Console rendering of the exploratory tables.
//!
//! Tabular output goes through Arrow's pretty printer so every table shares
//! one layout. Free text (info, null counts) is written directly.

use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray, UInt64Array};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;

use crate::data::model::{Column, Dataset, Record, Species, Summary};

/// Decimal places kept in computed statistics.
const DISPLAY_DECIMALS: i32 = 6;

fn round_for_display(v: f64) -> f64 {
    let scale = 10f64.powi(DISPLAY_DECIMALS);
    (v * scale).round() / scale
}

/// Assemble named columns into one batch and render it.
fn render_table(columns: Vec<(&str, ArrayRef)>) -> Result<String> {
    let fields: Vec<Field> = columns
        .iter()
        .map(|(name, array)| Field::new(*name, array.data_type().clone(), true))
        .collect();
    let arrays = columns.into_iter().map(|(_, a)| a).collect();
    let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)
        .context("assembling report table")?;
    Ok(pretty_format_batches(&[batch])
        .context("formatting report table")?
        .to_string())
}

fn measurement_array(records: &[Record], column: Column) -> ArrayRef {
    Arc::new(Float64Array::from_iter(records.iter().map(|r| r.numeric(column))))
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Rows as a table: row label, every column.
pub fn write_records(out: &mut impl Write, records: &[Record]) -> Result<()> {
    let mut columns: Vec<(&str, ArrayRef)> = vec![(
        "",
        Arc::new(UInt64Array::from_iter_values(
            records.iter().map(|r| r.index as u64),
        )),
    )];
    for col in Column::MEASUREMENTS {
        columns.push((col.name(), measurement_array(records, col)));
    }
    columns.push((
        Column::Target.name(),
        Arc::new(Int64Array::from_iter(records.iter().map(|r| r.target))),
    ));
    columns.push((
        Column::Species.name(),
        Arc::new(StringArray::from_iter(
            records.iter().map(|r| r.species.map(Species::name)),
        )),
    ));

    writeln!(out, "{}", render_table(columns)?)?;
    Ok(())
}

/// Summary statistics: one row per statistic, one column per numeric field.
pub fn write_summary(out: &mut impl Write, summaries: &[(Column, Summary)]) -> Result<()> {
    let mut columns: Vec<(&str, ArrayRef)> = vec![(
        "",
        Arc::new(StringArray::from(Summary::LABELS.to_vec())),
    )];
    for (col, summary) in summaries {
        let values = summary.values().map(round_for_display);
        columns.push((col.name(), Arc::new(Float64Array::from(values.to_vec()))));
    }

    writeln!(out, "{}", render_table(columns)?)?;
    Ok(())
}

/// Per-species means: one row per species, one column per numeric field.
pub fn write_group_means(
    out: &mut impl Write,
    means: &BTreeMap<Species, Vec<(Column, Option<f64>)>>,
) -> Result<()> {
    let mut columns: Vec<(&str, ArrayRef)> = vec![(
        Column::Species.name(),
        Arc::new(StringArray::from_iter_values(means.keys().map(|s| s.name()))),
    )];
    for (pos, col) in Column::NUMERIC.iter().enumerate() {
        let values = means
            .values()
            .map(|row| row.get(pos).and_then(|(_, v)| *v).map(round_for_display));
        columns.push((col.name(), Arc::new(Float64Array::from_iter(values))));
    }

    writeln!(out, "{}", render_table(columns)?)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Free-text sections
// ---------------------------------------------------------------------------

/// Row count, label range and per-column non-null count / dtype.
pub fn write_info(out: &mut impl Write, dataset: &Dataset) -> Result<()> {
    let records = dataset.records()?;
    match (records.first(), records.last()) {
        (Some(first), Some(last)) => writeln!(
            out,
            "Index: {} entries, {} to {}",
            dataset.len(),
            first.index,
            last.index
        )?,
        _ => writeln!(out, "Index: 0 entries")?,
    }
    writeln!(out, "Data columns (total {} columns):", Column::ALL.len())?;
    writeln!(out, " #   {:<20} {:<15} Dtype", "Column", "Non-Null Count")?;
    writeln!(out, "---  {:<20} {:<15} -----", "------", "--------------")?;

    let nulls = dataset.null_counts()?;
    for (pos, (col, missing)) in nulls.iter().enumerate() {
        let non_null = format!("{} non-null", dataset.len() - missing);
        writeln!(out, " {pos:<3} {:<20} {non_null:<15} {}", col.name(), col.dtype())?;
    }

    let mut dtypes: BTreeMap<&str, usize> = BTreeMap::new();
    for col in Column::ALL {
        *dtypes.entry(col.dtype()).or_default() += 1;
    }
    let dtypes: Vec<String> = dtypes.iter().map(|(t, n)| format!("{t}({n})")).collect();
    writeln!(out, "dtypes: {}", dtypes.join(", "))?;
    Ok(())
}

/// One line per column with its missing-value count.
pub fn write_null_counts(out: &mut impl Write, dataset: &Dataset) -> Result<()> {
    for (col, missing) in dataset.null_counts()? {
        writeln!(out, "{:<20} {missing}", col.name())?;
    }
    Ok(())
}
