use std::path::PathBuf;

use thiserror::Error;

use crate::data::model::Identifier;

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Failure to produce a [`SalesTable`](crate::data::model::SalesTable) from
/// its source. Fatal for the current process run.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("sales data not found: {0}")]
    NotFound(PathBuf),

    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("row {row}, column '{column}': invalid value '{value}'")]
    InvalidValue {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
}

// ---------------------------------------------------------------------------
// Forecasting
// ---------------------------------------------------------------------------

/// Failure to produce a forecast for one (store, department) selection.
/// Terminal for the interaction; a different selection may succeed.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ForecastError {
    #[error("no rows for store {store}, department {dept}")]
    EmptySelection { store: Identifier, dept: Identifier },

    #[error("need at least 2 distinct dates to fit, found {distinct_dates}")]
    InsufficientHistory { distinct_dates: usize },

    #[error("degenerate series: {0}")]
    Degenerate(String),

    #[error("invalid forecast configuration: {0}")]
    InvalidConfig(String),
}

impl ForecastError {
    /// Short message suitable for showing in place of a chart.
    pub fn user_message(&self) -> String {
        match self {
            ForecastError::EmptySelection { .. } => "No data for this selection.".to_string(),
            ForecastError::InsufficientHistory { .. } => {
                "Not enough history for this selection.".to_string()
            }
            ForecastError::Degenerate(_) => {
                "The sales history for this selection cannot be modelled.".to_string()
            }
            ForecastError::InvalidConfig(msg) => format!("Forecast settings are invalid: {msg}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages() {
        let err = ForecastError::EmptySelection {
            store: Identifier::Integer(999),
            dept: Identifier::Integer(999),
        };
        assert_eq!(err.user_message(), "No data for this selection.");
        assert!(err.to_string().contains("999"));

        let err = ForecastError::InsufficientHistory { distinct_dates: 1 };
        assert_eq!(err.user_message(), "Not enough history for this selection.");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "permission denied");
        let err = LoadError::from(io);
        assert!(matches!(err, LoadError::Io(_)));
        assert!(err.to_string().contains("permission denied"));
    }
}
