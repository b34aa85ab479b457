use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};

use crate::config::Frequency;

/// Most common positive gap, in days, between consecutive distinct dates.
/// Ties go to the shorter gap. `None` with fewer than two distinct dates.
pub fn infer_step_days(distinct_dates: &[NaiveDate]) -> Option<i64> {
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for pair in distinct_dates.windows(2) {
        let gap = (pair[1] - pair[0]).num_days();
        if gap > 0 {
            *counts.entry(gap).or_default() += 1;
        }
    }
    // BTreeMap iterates gaps ascending; keep the first maximum.
    counts
        .into_iter()
        .fold(None, |best: Option<(i64, usize)>, (gap, n)| match best {
            Some((_, best_n)) if best_n >= n => best,
            _ => Some((gap, n)),
        })
        .map(|(gap, _)| gap)
}

/// Step between projected dates for the configured frequency.
pub fn step_days(frequency: Frequency, distinct_dates: &[NaiveDate]) -> i64 {
    match frequency {
        Frequency::Daily => 1,
        Frequency::Weekly => 7,
        Frequency::Inferred => infer_step_days(distinct_dates).unwrap_or(1),
    }
}

/// `horizon` dates after `last`, `step` days apart.
pub fn future_dates(last: NaiveDate, step: i64, horizon: usize) -> Vec<NaiveDate> {
    (1..=horizon as i64)
        .map(|i| last + Duration::days(step * i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_infers_weekly_step_across_gaps() {
        let dates = [
            d("2024-01-01"),
            d("2024-01-08"),
            d("2024-01-15"),
            // a missing week
            d("2024-01-29"),
        ];
        assert_eq!(infer_step_days(&dates), Some(7));
        assert_eq!(step_days(Frequency::Inferred, &dates), 7);
        assert_eq!(step_days(Frequency::Daily, &dates), 1);
        assert_eq!(infer_step_days(&dates[..1]), None);
    }

    #[test]
    fn test_future_dates_continue_from_last() {
        let dates = future_dates(d("2024-01-08"), 7, 3);
        assert_eq!(dates, vec![d("2024-01-15"), d("2024-01-22"), d("2024-01-29")]);
        assert!(future_dates(d("2024-01-08"), 7, 0).is_empty());
    }
}
