use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array};
use arrow::datatypes::DataType;
use arrow::util::display::array_value_to_string;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::RawTable;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a flat table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row followed by records (ragged records allowed)
/// * `.json`    – `[{ "region": "N", "sales": 10 }, ...]`
/// * `.parquet` – any flat schema; every cell is rendered to text
pub fn load_file(path: &Path) -> Result<RawTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<RawTable> {
    let text = std::fs::read_to_string(path).context("reading CSV file")?;
    parse_csv(&text)
}

/// Parse CSV text already in memory.  Fields missing from a short record
/// read as empty text, the same as an explicitly empty field.
pub fn parse_csv(text: &str) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let columns: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        // Extra trailing fields have no header and are dropped.
        let row = (0..columns.len())
            .map(|idx| Some(record.get(idx).unwrap_or_default().to_string()))
            .collect();
        rows.push(row);
    }

    Ok(RawTable { columns, rows })
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON: a top-level array of flat objects.  Column order is
/// the first object's key order; keys first seen later are appended.
fn load_json(path: &Path) -> Result<RawTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_json(&text)
}

pub fn parse_json(text: &str) -> Result<RawTable> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;
    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut columns: Vec<String> = Vec::new();
    let mut objects = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
        objects.push(obj);
    }

    let rows = objects
        .into_iter()
        .map(|obj| {
            columns
                .iter()
                .map(|col| obj.get(col).map(json_to_text))
                .collect()
        })
        .collect();

    Ok(RawTable { columns, rows })
}

fn json_to_text(val: &JsonValue) -> String {
    match val {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a flat Parquet table.  Works with files written by both **Pandas**
/// (`df.to_parquet()`) and **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        // rows already collected from earlier batches
        let offset = rows.len();
        for row in 0..batch.num_rows() {
            let cells = batch
                .columns()
                .iter()
                .map(|col| cell_to_text(col, row).map(Some))
                .collect::<Result<Vec<_>>>()
                .with_context(|| format!("Row {}: failed to render cell", offset + row))?;
            rows.push(cells);
        }
    }

    Ok(RawTable { columns, rows })
}

/// Render one Arrow cell as text; nulls become empty text.
fn cell_to_text(col: &Arc<dyn Array>, row: usize) -> Result<String> {
    if col.is_null(row) {
        return Ok(String::new());
    }
    let text = match col.data_type() {
        DataType::Utf8 => col.as_string::<i32>().value(row).to_string(),
        DataType::LargeUtf8 => col.as_string::<i64>().value(row).to_string(),
        DataType::Int32 => downcast::<Int32Array>(col)?.value(row).to_string(),
        DataType::Int64 => downcast::<Int64Array>(col)?.value(row).to_string(),
        DataType::Float32 => downcast::<Float32Array>(col)?.value(row).to_string(),
        DataType::Float64 => downcast::<Float64Array>(col)?.value(row).to_string(),
        DataType::Boolean => downcast::<BooleanArray>(col)?.value(row).to_string(),
        _ => array_value_to_string(col, row)?,
    };
    Ok(text)
}

fn downcast<T: Array + 'static>(col: &Arc<dyn Array>) -> Result<&T> {
    col.as_any()
        .downcast_ref::<T>()
        .with_context(|| format!("unexpected array type {:?}", col.data_type()))
}
