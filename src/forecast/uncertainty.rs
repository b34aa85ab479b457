//! Simulated uncertainty intervals.
//!
//! Each draw extends the fitted trend past the history with new changepoints
//! arriving at the historical rate, then adds observation noise. Bounds are
//! empirical quantiles over the draws.

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp, Normal, Poisson};

use super::model::{piecewise_trend, FittedModel};

/// `(lower, upper)` per date. `yhat` holds the point estimates for the same
/// dates; every returned interval brackets its estimate.
pub fn intervals(
    model: &FittedModel,
    dates: &[NaiveDate],
    yhat: &[f64],
    interval_width: f64,
    samples: usize,
    seed: u64,
) -> Vec<(f64, f64)> {
    if samples == 0 || dates.is_empty() {
        return yhat.iter().map(|&v| (v, v)).collect();
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let ts: Vec<f64> = dates.iter().map(|d| model.scaled_time(*d)).collect();
    let seasonal: Vec<f64> = dates.iter().map(|d| model.seasonal(*d)).collect();
    let t_max = ts.iter().cloned().fold(1.0_f64, f64::max);

    let Ok(noise) = Normal::new(0.0, model.sigma_obs) else {
        log::warn!("invalid noise scale {}; intervals collapse to the point estimate", model.sigma_obs);
        return yhat.iter().map(|&v| (v, v)).collect();
    };
    let scale = model.y_scale();

    // draws[i] collects every simulated value for dates[i]
    let mut draws: Vec<Vec<f64>> = vec![Vec::with_capacity(samples); dates.len()];

    for _ in 0..samples {
        let (cps, deltas) = sample_changepoints(model, t_max, &mut rng);
        for (i, (&t, &s)) in ts.iter().zip(&seasonal).enumerate() {
            let trend = piecewise_trend(model.k, model.m, &cps, &deltas, t);
            let value = (trend + s + noise.sample(&mut rng)) * scale;
            draws[i].push(value);
        }
    }

    let lower_q = (1.0 - interval_width) / 2.0;
    let upper_q = (1.0 + interval_width) / 2.0;

    draws
        .iter_mut()
        .zip(yhat)
        .map(|(values, &point)| {
            values.sort_by(f64::total_cmp);
            let lower = quantile(values, lower_q).min(point);
            let upper = quantile(values, upper_q).max(point);
            (lower, upper)
        })
        .collect()
}

/// Fitted changepoints plus simulated future ones on (1, t_max].
fn sample_changepoints(
    model: &FittedModel,
    t_max: f64,
    rng: &mut StdRng,
) -> (Vec<f64>, Vec<f64>) {
    let mut cps = model.changepoints.clone();
    let mut deltas = model.deltas.clone();

    let rate = model.changepoints.len() as f64 * (t_max - 1.0);
    if rate <= 0.0 {
        return (cps, deltas);
    }

    let n_new = match Poisson::new(rate) {
        Ok(dist) => dist.sample(rng) as usize,
        Err(_) => 0,
    };
    let mean_abs_delta = if model.deltas.is_empty() {
        0.0
    } else {
        model.deltas.iter().map(|d| d.abs()).sum::<f64>() / model.deltas.len() as f64
    };
    let Some(laplace) = Laplace::new(mean_abs_delta + 1e-8) else {
        return (cps, deltas);
    };

    for _ in 0..n_new {
        cps.push(rng.gen_range(1.0..t_max));
        deltas.push(laplace.sample(rng));
    }
    (cps, deltas)
}

/// Laplace(0, b): an exponential magnitude with a fair random sign.
struct Laplace {
    magnitude: Exp<f64>,
}

impl Laplace {
    fn new(b: f64) -> Option<Self> {
        if !(b.is_finite() && b > 0.0) {
            return None;
        }
        Exp::new(1.0 / b).ok().map(|magnitude| Self { magnitude })
    }

    fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        let x = self.magnitude.sample(rng);
        if rng.gen::<bool>() {
            x
        } else {
            -x
        }
    }
}

/// Linear-interpolated quantile of sorted values.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let pos = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            let frac = pos - lo as f64;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ForecastConfig;
    use approx::assert_relative_eq;
    use chrono::Duration;

    #[test]
    fn test_quantile_interpolates() {
        let v = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_relative_eq!(quantile(&v, 0.0), 1.0);
        assert_relative_eq!(quantile(&v, 0.5), 3.0);
        assert_relative_eq!(quantile(&v, 0.1), 1.4);
        assert_relative_eq!(quantile(&v, 1.0), 5.0);
    }

    #[test]
    fn test_laplace_draws_are_finite_with_scale_b() {
        let mut rng = StdRng::seed_from_u64(3);
        let laplace = Laplace::new(0.2).unwrap();
        let draws: Vec<f64> = (0..20_000).map(|_| laplace.sample(&mut rng)).collect();

        assert!(draws.iter().all(|x| x.is_finite()));
        let mean = draws.iter().sum::<f64>() / draws.len() as f64;
        let mean_abs = draws.iter().map(|x| x.abs()).sum::<f64>() / draws.len() as f64;
        assert!(mean.abs() < 0.01, "mean {mean}");
        assert_relative_eq!(mean_abs, 0.2, max_relative = 0.05);
        assert!(draws.iter().any(|&x| x < 0.0) && draws.iter().any(|&x| x > 0.0));
    }

    #[test]
    fn test_laplace_rejects_invalid_scale() {
        assert!(Laplace::new(0.0).is_none());
        assert!(Laplace::new(f64::NAN).is_none());
        assert!(Laplace::new(-1.0).is_none());
    }

    fn noisy_model() -> (FittedModel, Vec<NaiveDate>) {
        let start = NaiveDate::from_ymd_opt(2011, 1, 7).unwrap();
        let dates: Vec<NaiveDate> = (0..60).map(|i| start + Duration::weeks(i)).collect();
        let values: Vec<f64> = (0..60)
            .map(|i| 200.0 + 2.0 * i as f64 + if i % 2 == 0 { 15.0 } else { -15.0 })
            .collect();
        let model = FittedModel::fit(&dates, &values, &ForecastConfig::default()).unwrap();
        (model, dates)
    }

    #[test]
    fn test_intervals_bracket_and_widen() {
        let (model, history) = noisy_model();
        let last = *history.last().unwrap();
        let future: Vec<NaiveDate> = (1..=20).map(|i| last + Duration::weeks(i)).collect();
        let mut dates = history.clone();
        dates.extend(&future);

        let yhat: Vec<f64> = dates.iter().map(|d| model.predict(*d)).collect();
        let bounds = intervals(&model, &dates, &yhat, 0.8, 500, 7);

        assert_eq!(bounds.len(), dates.len());
        for ((lo, hi), y) in bounds.iter().zip(&yhat) {
            assert!(lo <= y && y <= hi);
        }
        let first_width = bounds[0].1 - bounds[0].0;
        assert!(first_width > 0.0);
        // Trend uncertainty grows with distance from the history.
        let near = bounds[history.len()].1 - bounds[history.len()].0;
        let far = bounds.last().unwrap().1 - bounds.last().unwrap().0;
        assert!(far >= near * 0.9, "near {near}, far {far}");
    }

    #[test]
    fn test_same_seed_same_intervals() {
        let (model, dates) = noisy_model();
        let yhat: Vec<f64> = dates.iter().map(|d| model.predict(*d)).collect();
        let a = intervals(&model, &dates, &yhat, 0.8, 200, 42);
        let b = intervals(&model, &dates, &yhat, 0.8, 200, 42);
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_samples_collapse_to_point() {
        let (model, dates) = noisy_model();
        let yhat: Vec<f64> = dates.iter().map(|d| model.predict(*d)).collect();
        let bounds = intervals(&model, &dates, &yhat, 0.8, 0, 0);
        for ((lo, hi), y) in bounds.iter().zip(&yhat) {
            assert_eq!(lo, y);
            assert_eq!(hi, y);
        }
    }
}
