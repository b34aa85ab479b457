use std::collections::BTreeSet;

use serde::Serialize;

use super::model::FilteredSeries;

/// Aggregates shown next to the charts for one selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSummary {
    /// Sum of `Weekly_Sales`.
    pub total_sales: f64,
    /// Mean of `Weekly_Sales`; `None` for an empty selection.
    pub avg_sales: Option<f64>,
    /// Number of distinct dates.
    pub num_weeks: usize,
}

impl SeriesSummary {
    pub fn from_series(series: &FilteredSeries) -> Self {
        let total_sales: f64 = series.records.iter().map(|r| r.weekly_sales).sum();
        let avg_sales = if series.is_empty() {
            None
        } else {
            Some(total_sales / series.len() as f64)
        };
        let num_weeks = series
            .records
            .iter()
            .map(|r| r.date)
            .collect::<BTreeSet<_>>()
            .len();

        SeriesSummary {
            total_sales,
            avg_sales,
            num_weeks,
        }
    }
}
