use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use log::{info, warn};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Attribute, AttributeKind, CustomerRecord, Dataset, Value};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a customer dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with the bank churn column names (recommended)
/// * `.json`    – `[{ "CustomerId": 1, "Exited": 0, ... }, ...]`
/// * `.parquet` – one column per attribute
///
/// Columns that are not part of the customer schema are ignored. The schema
/// columns found in the file become the dataset's column list.
pub fn load_file(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    info!(
        "loaded {} customers with {} schema column(s) from {}",
        dataset.len(),
        dataset.columns().len(),
        path.display()
    );
    Ok(dataset)
}

/// Map source column names onto schema attributes, warning about the rest.
fn schema_columns<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<(usize, Attribute)> {
    let mut ignored = Vec::new();
    let columns = names
        .into_iter()
        .enumerate()
        .filter_map(|(i, name)| match name.parse::<Attribute>() {
            Ok(attr) => Some((i, attr)),
            Err(_) => {
                ignored.push(name.to_string());
                None
            }
        })
        .collect();
    if !ignored.is_empty() {
        warn!("ignoring non-schema column(s): {}", ignored.join(", "));
    }
    columns
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one customer per line.
/// Empty cells are nulls.
fn load_csv(path: &Path) -> Result<Dataset> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers = reader.headers().context("reading CSV headers")?.clone();
    let columns = schema_columns(headers.iter());

    let mut records = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let row = result.with_context(|| format!("CSV row {row_no}"))?;

        let mut record = CustomerRecord::default();
        for &(col_idx, attr) in &columns {
            let cell = row.get(col_idx).unwrap_or("");
            record
                .set(attr, csv_cell(attr, cell))
                .with_context(|| format!("CSV row {row_no}"))?;
        }
        records.push(record);
    }

    Ok(Dataset::with_columns(
        records,
        columns.into_iter().map(|(_, attr)| attr),
    ))
}

/// Text columns keep the cell verbatim; everything else is type-guessed.
fn csv_cell(attr: Attribute, cell: &str) -> Value {
    let trimmed = cell.trim();
    match attr.kind() {
        AttributeKind::Text if trimmed.is_empty() => Value::Null,
        AttributeKind::Text => Value::Text(trimmed.to_string()),
        _ => guess_value_type(trimmed),
    }
}

fn guess_value_type(s: &str) -> Value {
    let s = s.trim();
    if s.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return Value::Float(f);
    }
    if s == "true" || s == "false" {
        return Value::Bool(s == "true");
    }
    Value::Text(s.to_string())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default
/// `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "CustomerId": 15634602, "Geography": "France", "Balance": 0.0, "Exited": 1 },
///   ...
/// ]
/// ```
///
/// A column is part of the schema if any record carries it; records missing
/// it read as null.
fn load_json(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let rows = root.as_array().context("Expected top-level JSON array")?;

    let mut present = BTreeSet::new();
    let mut records = Vec::with_capacity(rows.len());

    for (i, row) in rows.iter().enumerate() {
        let obj = row
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let mut record = CustomerRecord::default();
        for (key, val) in obj {
            let Ok(attr) = key.parse::<Attribute>() else {
                continue;
            };
            present.insert(attr);
            record
                .set(attr, json_to_value(val))
                .with_context(|| format!("Row {i}"))?;
        }
        records.push(record);
    }

    Ok(Dataset::with_columns(records, present))
}

fn json_to_value(val: &JsonValue) -> Value {
    match val {
        JsonValue::String(s) => Value::Text(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                Value::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Null => Value::Null,
        other => Value::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one column per attribute.
///
/// Integer, float, boolean and string columns are understood; works with
/// files written by both **Pandas** (`df.to_parquet()`) and **Polars**
/// (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;

    let schema = builder.schema().clone();
    let columns = schema_columns(schema.fields().iter().map(|f| f.name().as_str()));

    let reader = builder.build().context("building parquet reader")?;
    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let offset = records.len();

        for row in 0..batch.num_rows() {
            let mut record = CustomerRecord::default();
            for &(col_idx, attr) in &columns {
                let value = extract_value(batch.column(col_idx), row)
                    .with_context(|| format!("Row {}: column '{attr}'", offset + row))?;
                record
                    .set(attr, value)
                    .with_context(|| format!("Row {}", offset + row))?;
            }
            records.push(record);
        }
    }

    Ok(Dataset::with_columns(
        records,
        columns.into_iter().map(|(_, attr)| attr),
    ))
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_value(col: &Arc<dyn Array>, row: usize) -> Result<Value> {
    if col.is_null(row) {
        return Ok(Value::Null);
    }
    let value = match col.data_type() {
        DataType::Utf8 => Value::Text(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => Value::Text(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => Value::Integer(i64::from(col.as_primitive::<Int32Type>().value(row))),
        DataType::Int64 => Value::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => Value::Float(f64::from(col.as_primitive::<Float32Type>().value(row))),
        DataType::Float64 => Value::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => Value::Bool(col.as_boolean().value(row)),
        other => bail!("unsupported column type {other:?}"),
    };
    Ok(value)
}
