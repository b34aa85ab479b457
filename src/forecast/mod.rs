/// Forecast layer: fits an additive model to one (store, dept) series and
/// projects it forward with uncertainty bounds.
///
/// ```text
///   FilteredSeries
///        │
///        ▼
///   ┌──────────┐
///   │  model    │  scale, changepoints, Fourier terms → MAP fit
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  cadence  │  history dates + horizon future dates
///   └──────────┘
///        │
///        ▼
///   ┌─────────────┐
///   │ uncertainty │  simulated draws → yhat_lower / yhat_upper
///   └─────────────┘
/// ```

pub mod cadence;
pub mod linalg;
pub mod model;
pub mod uncertainty;

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::ForecastConfig;
use crate::data::filter::filter_series;
use crate::data::model::{FilteredSeries, Identifier, SalesTable};
use crate::error::ForecastError;
use model::FittedModel;

/// One projected (or back-fitted) date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub ds: NaiveDate,
    pub yhat: f64,
    pub yhat_upper: f64,
    pub yhat_lower: f64,
}

/// Filter `table` to the selection and forecast it.
pub fn train_forecast(
    table: &SalesTable,
    store: &Identifier,
    dept: &Identifier,
    config: &ForecastConfig,
) -> Result<Vec<ForecastPoint>, ForecastError> {
    forecast_series(&filter_series(table, store, dept), config)
}

/// Forecast an already filtered series.
///
/// With `include_history` the result holds every distinct history date
/// followed by `horizon` future dates; otherwise only the future dates.
pub fn forecast_series(
    series: &FilteredSeries,
    config: &ForecastConfig,
) -> Result<Vec<ForecastPoint>, ForecastError> {
    config.validate()?;

    if series.is_empty() {
        return Err(ForecastError::EmptySelection {
            store: series.store.clone(),
            dept: series.dept.clone(),
        });
    }

    let history = series.distinct_dates();
    if history.len() < 2 {
        return Err(ForecastError::InsufficientHistory {
            distinct_dates: history.len(),
        });
    }

    let values = series.values();
    if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
        return Err(ForecastError::Degenerate(format!(
            "non-finite sales value {bad}"
        )));
    }

    let model = FittedModel::fit(&series.dates(), &values, config)?;

    let step = cadence::step_days(config.frequency, &history);
    let last = history[history.len() - 1];
    let future = cadence::future_dates(last, step, config.horizon);

    let dates: Vec<NaiveDate> = if config.include_history {
        history.into_iter().chain(future).collect()
    } else {
        future
    };

    let yhat: Vec<f64> = dates.iter().map(|d| model.predict(*d)).collect();
    let bounds = uncertainty::intervals(
        &model,
        &dates,
        &yhat,
        config.interval_width,
        config.uncertainty_samples,
        config.seed,
    );

    log::info!(
        "forecast for store {} / dept {}: {} points, step {} days",
        series.store,
        series.dept,
        dates.len(),
        step
    );

    Ok(dates
        .into_iter()
        .zip(yhat)
        .zip(bounds)
        .map(|((ds, yhat), (yhat_lower, yhat_upper))| ForecastPoint {
            ds,
            yhat,
            yhat_upper,
            yhat_lower,
        })
        .collect())
}
