use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Date32Type, Float64Type, Int64Type};
use arrow::temporal_conversions::date32_to_datetime;
use chrono::{NaiveDate, NaiveDateTime};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Identifier, SalesRecord, SalesTable};
use crate::error::LoadError;

/// Column names the source must carry, matched exactly.
pub const STORE_COLUMN: &str = "Store";
pub const DEPT_COLUMN: &str = "Dept";
pub const DATE_COLUMN: &str = "Date";
pub const SALES_COLUMN: &str = "Weekly_Sales";

type Result<T> = std::result::Result<T, LoadError>;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a sales table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with at least `Store,Dept,Date,Weekly_Sales`
/// * `.parquet` – the same columns; dates may be native date/timestamp types
/// * `.json`    – `[{ "Store": 1, "Dept": 1, "Date": "2010-02-05", "Weekly_Sales": 24924.5 }, ...]`
///
/// Any other columns (e.g. `IsHoliday`) are ignored.
pub fn load_file(path: &Path) -> Result<SalesTable> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" => load_csv(path)?,
        "parquet" | "pq" => load_parquet(path)?,
        "json" => load_json(path)?,
        other => return Err(LoadError::UnsupportedFormat(other.to_string())),
    };

    log::info!(
        "loaded {} sales records ({} stores, {} departments) from {}",
        table.len(),
        table.stores.len(),
        table.depts.len(),
        path.display()
    );
    Ok(table)
}

/// Parse a date cell. Accepts ISO dates, ISO date-times and `DD/MM/YYYY`.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(s, "%d/%m/%Y").ok()
}

fn invalid(row: usize, column: &'static str, value: impl Into<String>) -> LoadError {
    LoadError::InvalidValue {
        row,
        column,
        value: value.into(),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<SalesTable> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

    let column = |name: &'static str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or(LoadError::MissingColumn(name))
    };
    let store_idx = column(STORE_COLUMN)?;
    let dept_idx = column(DEPT_COLUMN)?;
    let date_idx = column(DATE_COLUMN)?;
    let sales_idx = column(SALES_COLUMN)?;

    let mut records = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result?;
        let cell = |idx: usize| record.get(idx).unwrap_or("");

        let store = parse_identifier(cell(store_idx), row_no, STORE_COLUMN)?;
        let dept = parse_identifier(cell(dept_idx), row_no, DEPT_COLUMN)?;
        let date = parse_date(cell(date_idx))
            .ok_or_else(|| invalid(row_no, DATE_COLUMN, cell(date_idx)))?;
        let weekly_sales = cell(sales_idx)
            .trim()
            .parse::<f64>()
            .map_err(|_| invalid(row_no, SALES_COLUMN, cell(sales_idx)))?;

        records.push(SalesRecord {
            store,
            dept,
            date,
            weekly_sales,
        });
    }

    Ok(SalesTable::from_records(records))
}

fn parse_identifier(s: &str, row: usize, column: &'static str) -> Result<Identifier> {
    if s.trim().is_empty() {
        return Err(invalid(row, column, s));
    }
    Ok(Identifier::parse(s))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`).
/// Identifiers may be numbers or strings; `Date` is a string.
fn load_json(path: &Path) -> Result<SalesTable> {
    let text = std::fs::read_to_string(path)?;
    let rows: Vec<JsonValue> = serde_json::from_str(&text)?;

    let mut records = Vec::with_capacity(rows.len());

    for (i, row) in rows.iter().enumerate() {
        let obj = row
            .as_object()
            .ok_or_else(|| invalid(i, STORE_COLUMN, row.to_string()))?;

        let field = |name: &'static str| obj.get(name).ok_or(LoadError::MissingColumn(name));

        let store = json_identifier(field(STORE_COLUMN)?, i, STORE_COLUMN)?;
        let dept = json_identifier(field(DEPT_COLUMN)?, i, DEPT_COLUMN)?;

        let date_val = field(DATE_COLUMN)?;
        let date = date_val
            .as_str()
            .and_then(parse_date)
            .ok_or_else(|| invalid(i, DATE_COLUMN, date_val.to_string()))?;

        let sales_val = field(SALES_COLUMN)?;
        let weekly_sales = match sales_val {
            JsonValue::Number(n) => n.as_f64(),
            JsonValue::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .ok_or_else(|| invalid(i, SALES_COLUMN, sales_val.to_string()))?;

        records.push(SalesRecord {
            store,
            dept,
            date,
            weekly_sales,
        });
    }

    Ok(SalesTable::from_records(records))
}

fn json_identifier(val: &JsonValue, row: usize, column: &'static str) -> Result<Identifier> {
    match val {
        JsonValue::Number(n) => n
            .as_i64()
            .map(Identifier::Integer)
            .ok_or_else(|| invalid(row, column, n.to_string())),
        JsonValue::String(s) => parse_identifier(s, row, column),
        other => Err(invalid(row, column, other.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file containing sales records.
///
/// Column types accepted:
/// - `Store`, `Dept`: any integer type, whole-valued floats, or Utf8
/// - `Date`: Date32 / Date64 / Timestamp, or Utf8 in a format [`parse_date`] accepts
/// - `Weekly_Sales`: any numeric type
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<SalesTable> {
    let file = std::fs::File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result?;
        let schema = batch.schema();

        let column = |name: &'static str| {
            schema
                .index_of(name)
                .map(|idx| batch.column(idx).clone())
                .map_err(|_| LoadError::MissingColumn(name))
        };

        let offset = records.len();
        let stores = identifier_column(&column(STORE_COLUMN)?, offset, STORE_COLUMN)?;
        let depts = identifier_column(&column(DEPT_COLUMN)?, offset, DEPT_COLUMN)?;
        let dates = date_column(&column(DATE_COLUMN)?, offset)?;
        let sales = sales_column(&column(SALES_COLUMN)?, offset)?;

        for (((store, dept), date), weekly_sales) in
            stores.into_iter().zip(depts).zip(dates).zip(sales)
        {
            records.push(SalesRecord {
                store,
                dept,
                date,
                weekly_sales,
            });
        }
    }

    Ok(SalesTable::from_records(records))
}

// -- Arrow helpers --

fn identifier_column(
    col: &Arc<dyn Array>,
    offset: usize,
    name: &'static str,
) -> Result<Vec<Identifier>> {
    let null = |row: usize| invalid(offset + row, name, "null");

    match col.data_type() {
        DataType::Utf8 | DataType::LargeUtf8 => string_values(col)?
            .into_iter()
            .enumerate()
            .map(|(row, v)| {
                let v = v.ok_or_else(|| null(row))?;
                parse_identifier(&v, offset + row, name)
            })
            .collect(),
        dt if dt.is_integer() => {
            let ints = cast(col, &DataType::Int64)?;
            ints.as_primitive::<Int64Type>()
                .iter()
                .enumerate()
                .map(|(row, v)| v.map(Identifier::Integer).ok_or_else(|| null(row)))
                .collect()
        }
        dt if dt.is_floating() => {
            let floats = cast(col, &DataType::Float64)?;
            floats
                .as_primitive::<Float64Type>()
                .iter()
                .enumerate()
                .map(|(row, v)| {
                    let v = v.ok_or_else(|| null(row))?;
                    float_identifier(v).ok_or_else(|| invalid(offset + row, name, v.to_string()))
                })
                .collect()
        }
        other => Err(invalid(offset, name, format!("unsupported column type {other}"))),
    }
}

/// Whole floats within i64 range map to integer identifiers.
fn float_identifier(v: f64) -> Option<Identifier> {
    // i64::MIN is exactly representable; i64::MAX rounds up to 2^63.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    (v.is_finite() && v.fract() == 0.0 && v >= -LIMIT && v < LIMIT)
        .then(|| Identifier::Integer(v as i64))
}

fn date_column(col: &Arc<dyn Array>, offset: usize) -> Result<Vec<NaiveDate>> {
    match col.data_type() {
        DataType::Utf8 | DataType::LargeUtf8 => string_values(col)?
            .into_iter()
            .enumerate()
            .map(|(row, v)| {
                let v = v.unwrap_or_default();
                parse_date(&v).ok_or_else(|| invalid(offset + row, DATE_COLUMN, v))
            })
            .collect(),
        _ => {
            let days = cast(col, &DataType::Date32)?;
            days.as_primitive::<Date32Type>()
                .iter()
                .enumerate()
                .map(|(row, v)| {
                    v.and_then(date32_to_datetime)
                        .map(|dt| dt.date())
                        .ok_or_else(|| invalid(offset + row, DATE_COLUMN, "null"))
                })
                .collect()
        }
    }
}

fn sales_column(col: &Arc<dyn Array>, offset: usize) -> Result<Vec<f64>> {
    let values = cast(col, &DataType::Float64)?;
    values
        .as_primitive::<Float64Type>()
        .iter()
        .enumerate()
        .map(|(row, v)| v.ok_or_else(|| invalid(offset + row, SALES_COLUMN, "null")))
        .collect()
}

/// Normalise Utf8 / LargeUtf8 to owned optional strings.
fn string_values(col: &Arc<dyn Array>) -> Result<Vec<Option<String>>> {
    let utf8 = cast(col, &DataType::Utf8)?;
    Ok(utf8
        .as_string::<i32>()
        .iter()
        .map(|v| v.map(str::to_string))
        .collect())
}
