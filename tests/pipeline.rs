use std::io::Write;
use std::sync::Arc;

use arrow::array::{Date32Array, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Duration, NaiveDate};
use parquet::arrow::ArrowWriter;
use tempfile::NamedTempFile;

use sales_forecast::data::filter::filter_series;
use sales_forecast::data::loader::load_file;
use sales_forecast::data::summary::SeriesSummary;
use sales_forecast::{
    train_forecast, AppState, ForecastConfig, ForecastError, Identifier, SalesCache,
};

fn csv_fixture(body: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(file, "Store,Dept,Date,Weekly_Sales,IsHoliday").unwrap();
    write!(file, "{body}").unwrap();
    file
}

/// Two stores, two departments, 60 weeks each, rows shuffled by department.
fn weekly_fixture() -> NamedTempFile {
    let start = NaiveDate::from_ymd_opt(2011, 1, 7).unwrap();
    let mut body = String::new();
    for week in (0..60).rev() {
        for (store, dept) in [(1, 1), (1, 2), (2, 1), (2, 2)] {
            let date = start + Duration::weeks(week);
            let sales = 1000.0 * store as f64 + 100.0 * dept as f64 + 5.0 * week as f64
                + if week % 3 == 0 { 40.0 } else { -20.0 };
            body.push_str(&format!("{store},{dept},{date},{sales},FALSE\n"));
        }
    }
    csv_fixture(&body)
}

fn config(horizon: usize) -> ForecastConfig {
    ForecastConfig {
        horizon,
        uncertainty_samples: 300,
        ..Default::default()
    }
}

#[test]
fn test_concrete_two_week_scenario() {
    let file = csv_fixture("1,1,2024-01-08,150,FALSE\n1,1,2024-01-01,100,FALSE\n");
    let table = load_file(file.path()).unwrap();
    let one = Identifier::Integer(1);

    let series = filter_series(&table, &one, &one);
    assert_eq!(series.len(), 2);
    assert_eq!(series.values(), vec![100.0, 150.0]);

    let summary = SeriesSummary::from_series(&series);
    assert_eq!(summary.total_sales, 250.0);
    assert_eq!(summary.avg_sales, Some(125.0));
    assert_eq!(summary.num_weeks, 2);
}

#[test]
fn test_filtered_rows_are_a_sorted_subset() {
    let file = weekly_fixture();
    let table = load_file(file.path()).unwrap();

    for store in table.store_ids() {
        for dept in table.dept_ids() {
            let series = filter_series(&table, &store, &dept);
            assert_eq!(series.len(), 60);
            for r in &series.records {
                assert_eq!(r.store, store);
                assert_eq!(r.dept, dept);
                assert!(table.records.contains(r));
            }
            for pair in series.records.windows(2) {
                assert!(pair[0].date <= pair[1].date);
            }
        }
    }
}

#[test]
fn test_full_frame_forecast_properties() {
    let file = weekly_fixture();
    let table = load_file(file.path()).unwrap();
    let store = Identifier::Integer(2);
    let dept = Identifier::Integer(1);

    let points = train_forecast(&table, &store, &dept, &config(90)).unwrap();
    let history = filter_series(&table, &store, &dept).distinct_dates();

    assert_eq!(points.len(), history.len() + 90);
    assert_eq!(points[0].ds, history[0]);
    assert_eq!(points[history.len()].ds, *history.last().unwrap() + Duration::weeks(1));
    for p in &points {
        assert!(p.yhat_lower <= p.yhat, "{p:?}");
        assert!(p.yhat <= p.yhat_upper, "{p:?}");
    }
}

#[test]
fn test_duplicate_dates_collapse_in_forecast_frame() {
    // Two rows per week for 40 weeks.
    let start = NaiveDate::from_ymd_opt(2011, 1, 7).unwrap();
    let mut body = String::new();
    for week in 0..40 {
        let date = start + Duration::weeks(week);
        body.push_str(&format!("5,9,{date},{},FALSE\n", 300.0 + week as f64));
        body.push_str(&format!("5,9,{date},{},FALSE\n", 260.0 + week as f64));
    }
    let file = csv_fixture(&body);
    let table = load_file(file.path()).unwrap();
    let store = Identifier::Integer(5);
    let dept = Identifier::Integer(9);

    let series = filter_series(&table, &store, &dept);
    assert_eq!(series.len(), 80);
    assert_eq!(SeriesSummary::from_series(&series).num_weeks, 40);

    let points = train_forecast(&table, &store, &dept, &config(5)).unwrap();
    assert_eq!(points.len(), 40 + 5);

    let history = &points[..40];
    for pair in history.windows(2) {
        assert!(pair[0].ds < pair[1].ds);
    }
    assert_eq!(history[0].ds, start);
    for p in &points {
        assert!(p.yhat_lower <= p.yhat && p.yhat <= p.yhat_upper, "{p:?}");
    }
}

#[test]
fn test_forecast_is_deterministic() {
    let file = weekly_fixture();
    let table = load_file(file.path()).unwrap();
    let one = Identifier::Integer(1);

    let a = train_forecast(&table, &one, &one, &config(10)).unwrap();
    let b = train_forecast(&table, &one, &one, &config(10)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_unknown_selection_does_not_crash() {
    let file = weekly_fixture();
    let mut state = AppState::new(SalesCache::new(file.path()), config(10));
    let missing = Identifier::Integer(999);

    let selection = state.select(&missing, &missing).unwrap();
    assert!(selection.series.is_empty());
    assert_eq!(selection.summary.num_weeks, 0);
    assert!(matches!(
        selection.forecast,
        Err(ForecastError::EmptySelection { .. })
    ));
    assert_eq!(
        state.status_message.as_deref(),
        Some("No data for this selection.")
    );
}

#[test]
fn test_loader_memoisation_returns_identical_tables() {
    let file = weekly_fixture();
    let mut cache = SalesCache::new(file.path());

    let first = cache.get().unwrap();
    let second = cache.get().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(cache.load_count(), 1);

    let reloaded = cache.reload().unwrap();
    assert!(!Arc::ptr_eq(&first, &reloaded));
    assert_eq!(*first, *reloaded);
}

#[test]
fn test_parquet_source() {
    let schema = Arc::new(Schema::new(vec![
        Field::new("Store", DataType::Int64, false),
        Field::new("Dept", DataType::Utf8, false),
        Field::new("Date", DataType::Date32, false),
        Field::new("Weekly_Sales", DataType::Float64, false),
    ]));
    // 2024-01-01 and 2024-01-08 as days since the epoch
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from(vec![1, 1, 2])),
            Arc::new(StringArray::from(vec!["7", "7", "7"])),
            Arc::new(Date32Array::from(vec![19723, 19730, 19723])),
            Arc::new(Float64Array::from(vec![100.0, 150.0, -5.0])),
        ],
    )
    .unwrap();

    let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
    let mut writer = ArrowWriter::try_new(std::fs::File::create(file.path()).unwrap(), schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();

    let table = load_file(file.path()).unwrap();
    assert_eq!(table.len(), 3);
    assert_eq!(table.records[0].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    assert_eq!(table.records[2].weekly_sales, -5.0);
    assert_eq!(table.dept_ids(), vec![Identifier::Integer(7)]);
}
