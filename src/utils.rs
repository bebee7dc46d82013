//! Utility functions shared by sessions, training and the CLI

use std::time::Duration;

use statrs::distribution::{ContinuousCDF, Normal};

use crate::{Error, Result};

/// Timestamp used to tag sessions, CSV rows and saved Q-tables.
///
/// The format is sortable and contains no separators, so it can be glued
/// directly into file names (e.g. `20240131093005`).
pub fn datetime_id() -> String {
    chrono::Local::now().format("%Y%m%d%H%M%S").to_string()
}

/// Milliseconds in a duration as a float.
pub fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

/// Convert a budget given in minutes into a [`Duration`].
///
/// Negative, NaN, infinite and out-of-range values are rejected.
pub fn minutes_to_duration(minutes: f64) -> Result<Duration> {
    if !(minutes.is_finite() && minutes >= 0.0) {
        return Err(Error::InvalidConfiguration {
            message: format!("max_minutes must be a finite number >= 0, got {minutes}"),
        });
    }
    Duration::try_from_secs_f64(minutes * 60.0).map_err(|e| Error::InvalidConfiguration {
        message: format!("max_minutes {minutes} is out of range: {e}"),
    })
}

/// Fold one more observation into a running mean over `count` observations
/// (where `count` already includes the new one).
///
/// # Examples
///
/// ```
/// use tabq::utils::running_mean;
///
/// let mut mean = 0.0;
/// for (i, x) in [2.0, 4.0, 9.0].into_iter().enumerate() {
///     mean = running_mean(mean, x, i + 1);
/// }
/// assert!((mean - 5.0).abs() < 1e-12);
/// ```
pub fn running_mean(mean: f64, value: f64, count: usize) -> f64 {
    if count == 0 {
        return mean;
    }
    mean + (value - mean) / count as f64
}

/// Fraction of `successes` in `trials`, or 0 when there were no trials.
pub fn rate(successes: usize, trials: usize) -> f64 {
    if trials == 0 {
        0.0
    } else {
        successes as f64 / trials as f64
    }
}

/// Wilson score interval for a binomial proportion.
///
/// Returns `(low, high)` at the given two-sided confidence level
/// (e.g. `0.95`). With no trials the interval is the whole `[0, 1]` range.
///
/// # Examples
///
/// ```
/// use tabq::utils::wilson_interval;
///
/// let (low, high) = wilson_interval(50, 100, 0.95);
/// assert!(low < 0.5 && 0.5 < high);
/// assert!((low - 0.4038).abs() < 1e-3);
/// ```
pub fn wilson_interval(successes: usize, trials: usize, confidence: f64) -> (f64, f64) {
    if trials == 0 {
        return (0.0, 1.0);
    }
    let z = match Normal::new(0.0, 1.0) {
        Ok(normal) => normal.inverse_cdf(1.0 - (1.0 - confidence) / 2.0),
        Err(_) => 1.959_963_984_540_054,
    };
    let n = trials as f64;
    let p = successes as f64 / n;
    let z2 = z * z;
    let denominator = 1.0 + z2 / n;
    let centre = (p + z2 / (2.0 * n)) / denominator;
    let margin = z * ((p * (1.0 - p) / n) + z2 / (4.0 * n * n)).sqrt() / denominator;
    ((centre - margin).max(0.0), (centre + margin).min(1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_datetime_id_is_fourteen_digits() {
        let id = datetime_id();
        assert_eq!(id.len(), 14);
        assert!(id.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_running_mean_matches_arithmetic_mean() {
        let values = [3.0, 5.0, 10.0, 2.0];
        let mut mean = 0.0;
        for (i, &v) in values.iter().enumerate() {
            mean = running_mean(mean, v, i + 1);
        }
        assert!((mean - 5.0).abs() < 1e-12);
        assert_eq!(running_mean(7.0, 1.0, 0), 7.0);
    }

    #[test]
    fn test_wilson_interval_bounds() {
        let (low, high) = wilson_interval(0, 10, 0.95);
        assert!(low.abs() < 1e-9);
        assert!(high > 0.0 && high < 0.35);

        let (low, high) = wilson_interval(10, 10, 0.95);
        assert!(low > 0.65);
        assert!((high - 1.0).abs() < 1e-12);

        assert_eq!(wilson_interval(0, 0, 0.95), (0.0, 1.0));
    }

    #[test]
    fn test_rate_handles_zero_trials() {
        assert_eq!(rate(3, 0), 0.0);
        assert_eq!(rate(1, 4), 0.25);
    }

    #[test]
    fn test_minutes_to_duration_rejects_non_finite() {
        assert_eq!(minutes_to_duration(0.5).ok(), Some(Duration::from_secs(30)));
        assert_eq!(minutes_to_duration(0.0).ok(), Some(Duration::ZERO));
        for minutes in [f64::INFINITY, f64::NAN, -1.0, f64::MAX] {
            assert!(
                matches!(
                    minutes_to_duration(minutes),
                    Err(Error::InvalidConfiguration { .. })
                ),
                "{minutes} should be rejected"
            );
        }
    }
}
