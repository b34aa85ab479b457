use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::config::ForecastConfig;
use crate::data::cache::SalesCache;
use crate::data::filter::filter_series;
use crate::data::model::{FilteredSeries, Identifier, SalesTable};
use crate::data::summary::SeriesSummary;
use crate::error::{ForecastError, LoadError};
use crate::forecast::{forecast_series, ForecastPoint};

// ---------------------------------------------------------------------------
// Selection – everything shown for one (store, dept) choice
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Selection {
    pub series: FilteredSeries,
    pub summary: SeriesSummary,
    pub forecast: Result<Vec<ForecastPoint>, ForecastError>,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Application context: owns the table cache, the forecast settings and a
/// per-selection forecast memo. Independent of rendering.
pub struct AppState {
    cache: SalesCache,
    config: ForecastConfig,

    /// Successful forecasts keyed by (store, dept); cleared on reload or
    /// config change.
    forecasts: BTreeMap<(Identifier, Identifier), Vec<ForecastPoint>>,

    /// Status / error message for the last selection.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(cache: SalesCache, config: ForecastConfig) -> Self {
        Self {
            cache,
            config,
            forecasts: BTreeMap::new(),
            status_message: None,
        }
    }

    /// Source file behind the table cache.
    pub fn data_path(&self) -> &Path {
        self.cache.path()
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Replace the forecast settings and drop memoised forecasts.
    pub fn set_config(&mut self, config: ForecastConfig) {
        self.config = config;
        self.forecasts.clear();
    }

    /// The shared table, loaded on first access.
    pub fn table(&mut self) -> Result<Arc<SalesTable>, LoadError> {
        self.cache.get()
    }

    /// Sorted unique store identifiers.
    pub fn store_ids(&mut self) -> Result<Vec<Identifier>, LoadError> {
        Ok(self.table()?.store_ids())
    }

    /// Sorted unique department identifiers.
    pub fn dept_ids(&mut self) -> Result<Vec<Identifier>, LoadError> {
        Ok(self.table()?.dept_ids())
    }

    /// Re-read the source and forget memoised forecasts.
    pub fn reload(&mut self) -> Result<(), LoadError> {
        self.forecasts.clear();
        self.cache.reload()?;
        Ok(())
    }

    /// Filter, summarise and forecast one selection.
    ///
    /// Only a load failure is an `Err`; forecast failures are carried in
    /// [`Selection::forecast`] with a user-facing `status_message`.
    pub fn select(&mut self, store: &Identifier, dept: &Identifier) -> Result<Selection, LoadError> {
        let table = self.table()?;
        let series = filter_series(&table, store, dept);
        let summary = SeriesSummary::from_series(&series);

        let key = (store.clone(), dept.clone());
        let forecast = match self.forecasts.get(&key) {
            Some(points) => {
                log::debug!("reusing forecast for store {store} / dept {dept}");
                Ok(points.clone())
            }
            None => {
                let result = forecast_series(&series, &self.config);
                if let Ok(points) = &result {
                    self.forecasts.insert(key, points.clone());
                }
                result
            }
        };

        self.status_message = forecast.as_ref().err().map(|e| {
            log::warn!("{e}");
            e.user_message()
        });

        Ok(Selection {
            series,
            summary,
            forecast,
        })
    }
}
