//! Additive trend + seasonality model.
//!
//! ```text
//! y(t) = (k + Σ δⱼ·1[t ≥ sⱼ]) · t + m + Σ(-sⱼ δⱼ)·1[t ≥ sⱼ]   piecewise-linear trend
//!      + Σ βᵢ · fourierᵢ(date)                                seasonality
//!      + ε,  ε ~ N(0, σ²)
//! ```
//!
//! Parameters are fitted by maximum a posteriori on scaled data: time runs
//! 0..1 over the history and `y` is divided by `max |y|`.

use std::f64::consts::PI;

use chrono::{Datelike, NaiveDate};

use super::linalg::{cholesky_solve, cross, Matrix};
use crate::config::ForecastConfig;
use crate::error::ForecastError;

/// Prior scale on the base growth rate and offset.
const TREND_PRIOR_SCALE: f64 = 5.0;
/// Prior scale on the observation noise (half-normal).
const SIGMA_PRIOR_SCALE: f64 = 0.5;
const MAX_ITERATIONS: usize = 200;
const TOLERANCE: f64 = 1e-10;
/// Floor for reweighting |δ| so the Laplace penalty stays finite.
const MIN_DELTA_WEIGHT: f64 = 1e-8;
const MIN_SIGMA2: f64 = 1e-12;

// ---------------------------------------------------------------------------
// Seasonal components
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Seasonality {
    pub name: &'static str,
    /// Period in days.
    pub period: f64,
    pub fourier_order: usize,
}

impl Seasonality {
    pub fn yearly() -> Self {
        Self {
            name: "yearly",
            period: 365.25,
            fourier_order: 10,
        }
    }

    pub fn weekly() -> Self {
        Self {
            name: "weekly",
            period: 7.0,
            fourier_order: 3,
        }
    }

    /// `[sin(2πkt/P), cos(2πkt/P)]` for k = 1..=order, t in days since 1970-01-01.
    fn features(&self, date: NaiveDate, out: &mut Vec<f64>) {
        let t = days_since_epoch(date);
        for k in 1..=self.fourier_order {
            let x = 2.0 * PI * k as f64 * t / self.period;
            out.push(x.sin());
            out.push(x.cos());
        }
    }

    fn width(&self) -> usize {
        2 * self.fourier_order
    }
}

fn days_since_epoch(date: NaiveDate) -> f64 {
    // 1970-01-01 is day 719_163 counted from 0001-01-01.
    (date.num_days_from_ce() - 719_163) as f64
}

/// Seasonalities enabled automatically for the given history.
///
/// Yearly needs two years of range. Weekly needs two weeks of range and
/// spacing finer than a week. Dates carry no time of day, so daily
/// seasonality never applies.
pub fn auto_seasonalities(distinct_dates: &[NaiveDate]) -> Vec<Seasonality> {
    let (Some(first), Some(last)) = (distinct_dates.first(), distinct_dates.last()) else {
        return Vec::new();
    };
    let range_days = (*last - *first).num_days();
    let min_gap = distinct_dates
        .windows(2)
        .map(|p| (p[1] - p[0]).num_days())
        .filter(|&g| g > 0)
        .min();

    let mut out = Vec::new();
    if range_days >= 730 {
        out.push(Seasonality::yearly());
    }
    if range_days >= 14 && min_gap.is_some_and(|g| g < 7) {
        out.push(Seasonality::weekly());
    }
    out
}

// ---------------------------------------------------------------------------
// Fitted model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct FittedModel {
    start: NaiveDate,
    /// History range in days (scaled time 1.0).
    t_scale: f64,
    y_scale: f64,
    /// Base growth rate (scaled units).
    pub k: f64,
    /// Offset (scaled units).
    pub m: f64,
    /// Changepoint locations in scaled time.
    pub changepoints: Vec<f64>,
    /// Rate adjustment at each changepoint.
    pub deltas: Vec<f64>,
    pub seasonalities: Vec<Seasonality>,
    pub beta: Vec<f64>,
    /// Observation noise, scaled units.
    pub sigma_obs: f64,
}

impl FittedModel {
    /// Fit to rows sorted by date ascending. Needs at least two distinct
    /// dates and finite values; callers check both.
    pub fn fit(
        dates: &[NaiveDate],
        values: &[f64],
        config: &ForecastConfig,
    ) -> Result<Self, ForecastError> {
        let mut distinct = dates.to_vec();
        distinct.dedup();
        let (start, end) = match (distinct.first(), distinct.last()) {
            (Some(&s), Some(&e)) if e > s => (s, e),
            _ => {
                return Err(ForecastError::InsufficientHistory {
                    distinct_dates: distinct.len(),
                })
            }
        };

        let t_scale = (end - start).num_days() as f64;
        let y_scale = values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
        let y_scale = if y_scale > 0.0 { y_scale } else { 1.0 };

        let t: Vec<f64> = dates
            .iter()
            .map(|d| (*d - start).num_days() as f64 / t_scale)
            .collect();
        let y: Vec<f64> = values.iter().map(|v| v / y_scale).collect();

        let changepoints = place_changepoints(&t, config);
        let seasonalities = auto_seasonalities(&distinct);

        let mut model = FittedModel {
            start,
            t_scale,
            y_scale,
            k: 0.0,
            m: 0.0,
            changepoints,
            deltas: Vec::new(),
            seasonalities,
            beta: Vec::new(),
            sigma_obs: 0.0,
        };

        let rows: Vec<Vec<f64>> = dates
            .iter()
            .zip(&t)
            .map(|(d, &ti)| model.design_row(*d, ti))
            .collect();
        let theta = model.solve_map(&rows, &y, config)?;

        let n_cp = model.changepoints.len();
        model.k = theta.params[0];
        model.m = theta.params[1];
        model.deltas = theta.params[2..2 + n_cp].to_vec();
        model.beta = theta.params[2 + n_cp..].to_vec();
        model.sigma_obs = theta.sigma2.sqrt();

        log::info!(
            "fitted additive model on {} rows: {} changepoints, seasonalities [{}], sigma {:.4}, {} iterations",
            dates.len(),
            n_cp,
            model
                .seasonalities
                .iter()
                .map(|s| s.name)
                .collect::<Vec<_>>()
                .join(", "),
            model.sigma_obs,
            theta.iterations
        );
        Ok(model)
    }

    /// `[t, 1, (t - s₁)+, …, fourier…]`
    fn design_row(&self, date: NaiveDate, t: f64) -> Vec<f64> {
        let mut row = Vec::with_capacity(self.n_params());
        row.push(t);
        row.push(1.0);
        row.extend(self.changepoints.iter().map(|&s| (t - s).max(0.0)));
        for s in &self.seasonalities {
            s.features(date, &mut row);
        }
        row
    }

    fn n_params(&self) -> usize {
        2 + self.changepoints.len() + self.seasonalities.iter().map(Seasonality::width).sum::<usize>()
    }

    /// Iteratively reweighted ridge regression. Gaussian priors enter as a
    /// fixed diagonal precision, the Laplace prior on δ as `1 / (τ |δ|)`
    /// refreshed every iteration, and σ² takes its closed-form MAP under the
    /// half-normal prior.
    fn solve_map(
        &self,
        rows: &[Vec<f64>],
        y: &[f64],
        config: &ForecastConfig,
    ) -> Result<MapSolution, ForecastError> {
        let p = self.n_params();
        let n_cp = self.changepoints.len();
        let n = y.len() as f64;
        let tau = config.changepoint_prior_scale;

        let gram = Matrix::gram(rows, p);
        let xty = cross(rows, y, p);

        let mut precision = vec![0.0; p];
        precision[0] = 1.0 / TREND_PRIOR_SCALE.powi(2);
        precision[1] = 1.0 / TREND_PRIOR_SCALE.powi(2);
        for prec in precision.iter_mut().skip(2 + n_cp) {
            *prec = 1.0 / config.seasonality_prior_scale.powi(2);
        }
        let mut weights = vec![tau; n_cp];
        let mut sigma2 = SIGMA_PRIOR_SCALE.powi(2);
        let mut params = vec![0.0; p];

        for iteration in 1..=MAX_ITERATIONS {
            for (j, w) in weights.iter().enumerate() {
                precision[2 + j] = 1.0 / (tau * w);
            }

            let mut a = gram.clone();
            for (i, prec) in precision.iter().enumerate() {
                a.add(i, i, sigma2 * prec);
            }
            let next = cholesky_solve(&a, &xty)
                .ok_or_else(|| ForecastError::Degenerate("singular normal equations".into()))?;
            if next.iter().any(|v| !v.is_finite()) {
                return Err(ForecastError::Degenerate(
                    "non-finite model coefficients".into(),
                ));
            }

            let rss: f64 = rows
                .iter()
                .zip(y)
                .map(|(row, &yi)| {
                    let fit: f64 = row.iter().zip(&next).map(|(x, b)| x * b).sum();
                    (yi - fit).powi(2)
                })
                .sum();
            // argmin of n·ln σ + rss/(2σ²) + σ²/(2·0.5²)
            let c = 1.0 / SIGMA_PRIOR_SCALE.powi(2);
            sigma2 = ((-n + (n * n + 4.0 * c * rss).sqrt()) / (2.0 * c)).max(MIN_SIGMA2);

            let change = next
                .iter()
                .zip(&params)
                .map(|(a, b)| (a - b).abs())
                .fold(0.0_f64, f64::max);
            params = next;
            for (w, delta) in weights.iter_mut().zip(&params[2..2 + n_cp]) {
                *w = delta.abs().max(MIN_DELTA_WEIGHT);
            }

            if change < TOLERANCE {
                log::debug!("MAP fit converged after {iteration} iterations");
                return Ok(MapSolution {
                    params,
                    sigma2,
                    iterations: iteration,
                });
            }
        }

        log::warn!("MAP fit stopped at {MAX_ITERATIONS} iterations without converging");
        Ok(MapSolution {
            params,
            sigma2,
            iterations: MAX_ITERATIONS,
        })
    }

    // -- Prediction --

    /// Scaled time of a date relative to the history.
    pub fn scaled_time(&self, date: NaiveDate) -> f64 {
        (date - self.start).num_days() as f64 / self.t_scale
    }

    /// Multiplier taking scaled values back to sales units.
    pub fn y_scale(&self) -> f64 {
        self.y_scale
    }

    /// Trend in scaled units under the fitted changepoints.
    pub fn trend(&self, t: f64) -> f64 {
        piecewise_trend(self.k, self.m, &self.changepoints, &self.deltas, t)
    }

    /// Seasonal component in scaled units.
    pub fn seasonal(&self, date: NaiveDate) -> f64 {
        let mut features = Vec::with_capacity(self.beta.len());
        for s in &self.seasonalities {
            s.features(date, &mut features);
        }
        features.iter().zip(&self.beta).map(|(x, b)| x * b).sum()
    }

    /// Point estimate in sales units.
    pub fn predict(&self, date: NaiveDate) -> f64 {
        let t = self.scaled_time(date);
        (self.trend(t) + self.seasonal(date)) * self.y_scale
    }
}

struct MapSolution {
    params: Vec<f64>,
    sigma2: f64,
    iterations: usize,
}

/// `k·t + m + Σ δⱼ (t − sⱼ)+`
pub fn piecewise_trend(k: f64, m: f64, changepoints: &[f64], deltas: &[f64], t: f64) -> f64 {
    let adjust: f64 = changepoints
        .iter()
        .zip(deltas)
        .map(|(&s, &d)| d * (t - s).max(0.0))
        .sum();
    k * t + m + adjust
}

/// Potential changepoints: evenly spaced over the first `changepoint_range`
/// share of rows, excluding the first row.
fn place_changepoints(t: &[f64], config: &ForecastConfig) -> Vec<f64> {
    let hist_size = (t.len() as f64 * config.changepoint_range).floor() as usize;
    let n_cp = config.n_changepoints.min(hist_size.saturating_sub(1));
    if n_cp == 0 {
        return Vec::new();
    }

    let last = (hist_size - 1) as f64;
    (1..=n_cp)
        .map(|i| {
            let idx = (last * i as f64 / n_cp as f64).round() as usize;
            t[idx]
        })
        .collect()
}
