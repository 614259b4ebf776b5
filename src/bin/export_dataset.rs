//! Write the bundled reference dataset as Parquet and JSON, for trying the
//! file loaders: `export_dataset [output-dir]`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde_json::{Map, Value};

use iris_explorer::data::loader::load_bundled;
use iris_explorer::data::model::{Column, Record};

fn main() -> Result<()> {
    env_logger::init();

    let out_dir = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let records = load_bundled()?.records()?;
    log::info!("Exporting {} bundled records to {}", records.len(), out_dir.display());

    let json_path = out_dir.join("iris.json");
    write_json(&json_path, &records)?;
    log::info!("Wrote {}", json_path.display());

    let parquet_path = out_dir.join("iris.parquet");
    write_parquet(&parquet_path, &records)?;
    log::info!("Wrote {}", parquet_path.display());

    println!(
        "Wrote {} rows to {} and {}",
        records.len(),
        json_path.display(),
        parquet_path.display()
    );
    Ok(())
}

/// Records-oriented JSON keyed by column name; `target` stays an integer.
fn write_json(path: &Path, records: &[Record]) -> Result<()> {
    let rows: Vec<Value> = records
        .iter()
        .map(|r| {
            let mut row = Map::new();
            for col in Column::MEASUREMENTS {
                row.insert(col.name().to_string(), r.numeric(col).into());
            }
            row.insert(Column::Target.name().to_string(), r.target.into());
            Value::Object(row)
        })
        .collect();

    let json = serde_json::to_string_pretty(&rows).context("encoding JSON")?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))
}

/// One flat nullable column per numeric field.
fn write_parquet(path: &Path, records: &[Record]) -> Result<()> {
    let mut fields: Vec<Field> = Column::MEASUREMENTS
        .iter()
        .map(|c| Field::new(c.name(), DataType::Float64, true))
        .collect();
    fields.push(Field::new(Column::Target.name(), DataType::Int64, true));
    let schema = Arc::new(Schema::new(fields));

    let mut columns: Vec<ArrayRef> = Column::MEASUREMENTS
        .iter()
        .map(|&c| -> ArrayRef {
            Arc::new(Float64Array::from_iter(records.iter().map(|r| r.numeric(c))))
        })
        .collect();
    columns.push(Arc::new(Int64Array::from_iter(records.iter().map(|r| r.target))));

    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use iris_explorer::data::loader::load_file;
    use iris_explorer::data::model::Species;

    #[test]
    fn test_exported_files_load_back_as_the_bundled_table() {
        let dir = std::env::temp_dir()
            .join(format!("iris-explorer-export-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let records = load_bundled().unwrap().records().unwrap();

        let json_path = dir.join("iris.json");
        let parquet_path = dir.join("iris.parquet");
        write_json(&json_path, &records).unwrap();
        write_parquet(&parquet_path, &records).unwrap();

        for path in [&json_path, &parquet_path] {
            let loaded = load_file(path).unwrap().records().unwrap();
            assert_eq!(loaded, records, "{} differs", path.display());
            assert_eq!(loaded[149].species, Some(Species::Virginica));
        }
        let json = std::fs::read_to_string(&json_path).unwrap();
        assert!(json.contains("\"target\": 0"));
        assert!(!json.contains("\"target\": 0.0"));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
