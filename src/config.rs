//! Forecast settings.
//!
//! Defaults mirror the usual decomposable-model defaults: 25 potential
//! changepoints over the first 80% of history, an 80% interval from 1000
//! simulated paths, and a 90-period horizon.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ForecastError;

/// Spacing of projected dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// Most common gap between consecutive history dates.
    #[default]
    Inferred,
    Daily,
    Weekly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Number of future periods to project.
    pub horizon: usize,
    /// Coverage of the uncertainty interval, in (0, 1).
    pub interval_width: f64,
    /// Simulated paths used for the interval; 0 disables sampling.
    pub uncertainty_samples: usize,
    /// Upper bound on potential trend changepoints.
    pub n_changepoints: usize,
    /// Share of history (by rows) in which changepoints may be placed.
    pub changepoint_range: f64,
    /// Scale of the Laplace prior on changepoint rate adjustments.
    pub changepoint_prior_scale: f64,
    /// Scale of the Normal prior on Fourier coefficients.
    pub seasonality_prior_scale: f64,
    pub frequency: Frequency,
    /// Return history dates ahead of the projected ones.
    pub include_history: bool,
    /// Seed for the uncertainty simulation.
    pub seed: u64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon: 90,
            interval_width: 0.8,
            uncertainty_samples: 1000,
            n_changepoints: 25,
            changepoint_range: 0.8,
            changepoint_prior_scale: 0.05,
            seasonality_prior_scale: 10.0,
            frequency: Frequency::Inferred,
            include_history: true,
            seed: 0,
        }
    }
}

impl ForecastConfig {
    /// Read a JSON settings file. Missing keys take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: ForecastConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> std::result::Result<(), ForecastError> {
        let invalid = |msg: String| Err(ForecastError::InvalidConfig(msg));

        if !(self.interval_width > 0.0 && self.interval_width < 1.0) {
            return invalid(format!(
                "interval_width must be in (0, 1), got {}",
                self.interval_width
            ));
        }
        if !(self.changepoint_range > 0.0 && self.changepoint_range <= 1.0) {
            return invalid(format!(
                "changepoint_range must be in (0, 1], got {}",
                self.changepoint_range
            ));
        }
        if !(self.changepoint_prior_scale > 0.0) {
            return invalid("changepoint_prior_scale must be positive".to_string());
        }
        if !(self.seasonality_prior_scale > 0.0) {
            return invalid("seasonality_prior_scale must be positive".to_string());
        }
        Ok(())
    }
}
