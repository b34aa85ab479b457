//! Weekly retail sales explorer: load a sales table once, slice it by store
//! and department, summarise the slice and forecast it with uncertainty
//! bounds.

pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod forecast;
pub mod report;
pub mod state;

pub use config::ForecastConfig;
pub use data::cache::SalesCache;
pub use data::model::{FilteredSeries, Identifier, SalesRecord, SalesTable};
pub use error::{ForecastError, LoadError};
pub use forecast::{train_forecast, ForecastPoint};
pub use state::{AppState, Selection};
