//! Command-line interface argument parsing for sales-forecast.
//!
//! - `sales-forecast list --data train.csv`
//! - `sales-forecast forecast --data train.csv --store 1 --dept 1`
//! - `sales-forecast --config forecast.json forecast --data train.parquet --store 4 --dept 92 --json`

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::ForecastConfig;
use crate::data::model::Identifier;

/// Explore weekly sales by store and department and project them forward.
#[derive(Parser, Debug)]
#[command(name = "sales-forecast")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// JSON file with forecast settings
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the store and department identifiers available for selection
    List {
        /// Sales table (.csv, .parquet or .json)
        #[arg(short, long, default_value = "data/train.csv")]
        data: PathBuf,
    },

    /// Summarise and forecast one store/department pair
    Forecast {
        /// Sales table (.csv, .parquet or .json)
        #[arg(short, long, default_value = "data/train.csv")]
        data: PathBuf,

        #[arg(short, long)]
        store: Identifier,

        #[arg(long)]
        dept: Identifier,

        /// Number of future periods (overrides the config file)
        #[arg(long)]
        horizon: Option<usize>,

        /// Only print projected dates, not the fitted history
        #[arg(long)]
        future_only: bool,

        /// Emit JSON records instead of a table
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_path: PathBuf,
    pub forecast: ForecastConfig,
}

impl AppConfig {
    /// Start from the config file (or defaults) and apply CLI overrides.
    pub fn resolve(
        config_file: Option<&PathBuf>,
        data_path: PathBuf,
        horizon: Option<usize>,
        future_only: bool,
    ) -> Result<Self> {
        let mut forecast = match config_file {
            Some(path) => ForecastConfig::from_json_file(path)?,
            None => ForecastConfig::default(),
        };
        if let Some(h) = horizon {
            forecast.horizon = h;
        }
        if future_only {
            forecast.include_history = false;
        }

        Ok(AppConfig {
            data_path,
            forecast,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::resolve(None, PathBuf::from("train.csv"), None, false).unwrap();
        assert_eq!(config.forecast.horizon, 90);
        assert!(config.forecast.include_history);
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::resolve(None, PathBuf::from("train.csv"), Some(8), true).unwrap();
        assert_eq!(config.forecast.horizon, 8);
        assert!(!config.forecast.include_history);
    }

    #[test]
    fn test_parse_forecast_command() {
        let cli = Cli::try_parse_from([
            "sales-forecast",
            "forecast",
            "--store",
            "1",
            "--dept",
            "A9",
            "--json",
        ])
        .unwrap();
        match cli.command {
            Commands::Forecast {
                store, dept, json, ..
            } => {
                assert_eq!(store, Identifier::Integer(1));
                assert_eq!(dept, Identifier::Text("A9".into()));
                assert!(json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
