use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{BooleanArray, Date32Array, Float64Array, Int64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Duration, NaiveDate};
use parquet::arrow::ArrowWriter;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

struct Row {
    store: i64,
    dept: i64,
    date: NaiveDate,
    weekly_sales: f64,
    is_holiday: bool,
}

/// Fridays around the big US retail holidays.
fn is_holiday(date: NaiveDate) -> bool {
    use chrono::Datelike;
    matches!(
        (date.month(), date.day()),
        (2, 8..=14) | (9, 7..=13) | (11, 23..=29) | (12, 25..=31)
    )
}

fn generate(rng: &mut StdRng) -> Result<Vec<Row>> {
    // 143 Fridays, the span of the classic Walmart training set.
    let start = NaiveDate::from_ymd_opt(2010, 2, 5).context("start date")?;
    let weeks = 143;

    // (dept, base level, weekly growth, seasonal amplitude, noise)
    let depts = [
        (1, 24_000.0, 15.0, 0.25, 0.05),
        (2, 46_000.0, 5.0, 0.08, 0.03),
        (7, 18_000.0, -10.0, 0.40, 0.08),
        // small department that sees net returns in some weeks
        (47, 150.0, 0.0, 0.00, 2.00),
    ];

    let mut rows = Vec::new();
    for store in 1..=3_i64 {
        let store_factor = 1.0 - 0.2 * (store - 1) as f64;
        for &(dept, base, growth, amplitude, noise) in &depts {
            let noise = Normal::new(0.0, noise).context("noise distribution")?;
            for week in 0..weeks {
                let date = start + Duration::weeks(week);
                let holiday = is_holiday(date);
                let phase = 2.0 * std::f64::consts::PI * week as f64 / 52.18;
                let level = base * store_factor + growth * week as f64;
                let seasonal = 1.0 + amplitude * phase.cos();
                let spike = if holiday { 1.3 } else { 1.0 };
                let sales = level * seasonal * spike * (1.0 + noise.sample(rng));

                rows.push(Row {
                    store,
                    dept,
                    date,
                    weekly_sales: (sales * 100.0).round() / 100.0,
                    is_holiday: holiday,
                });
            }
        }
    }
    Ok(rows)
}

fn write_csv(rows: &[Row], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    writer.write_record(["Store", "Dept", "Date", "Weekly_Sales", "IsHoliday"])?;
    for r in rows {
        writer.write_record([
            r.store.to_string(),
            r.dept.to_string(),
            r.date.format("%Y-%m-%d").to_string(),
            r.weekly_sales.to_string(),
            if r.is_holiday { "TRUE" } else { "FALSE" }.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(rows: &[Row], path: &Path) -> Result<()> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).context("epoch")?;

    let schema = Arc::new(Schema::new(vec![
        Field::new("Store", DataType::Int64, false),
        Field::new("Dept", DataType::Int64, false),
        Field::new("Date", DataType::Date32, false),
        Field::new("Weekly_Sales", DataType::Float64, false),
        Field::new("IsHoliday", DataType::Boolean, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.store))),
            Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.dept))),
            Arc::new(Date32Array::from_iter_values(
                rows.iter().map(|r| (r.date - epoch).num_days() as i32),
            )),
            Arc::new(Float64Array::from_iter_values(
                rows.iter().map(|r| r.weekly_sales),
            )),
            Arc::new(BooleanArray::from(
                rows.iter().map(|r| r.is_holiday).collect::<Vec<_>>(),
            )),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).context("creating output file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    let output = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sample_sales.csv".to_string());
    let path = Path::new(&output);

    let mut rng = StdRng::seed_from_u64(42);
    let rows = generate(&mut rng)?;

    match path.extension().and_then(|e| e.to_str()) {
        Some("csv") => write_csv(&rows, path)?,
        Some("parquet") | Some("pq") => write_parquet(&rows, path)?,
        other => bail!("Unsupported output extension: {other:?}"),
    }

    println!("Wrote {} weekly sales rows to {output}", rows.len());
    Ok(())
}
