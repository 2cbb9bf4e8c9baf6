//! Per-candidate latency summaries.

use serde::{Deserialize, Serialize};

use crate::config::Aggregation;
use crate::error::{Error, Result};
use crate::measurement::trim_sorted;
use crate::types::LatencySample;

use super::quantile::{compute_quantile, median_abs_deviation};

/// Scale factor turning a MAD into a normal-consistent standard deviation.
const MAD_TO_SIGMA: f64 = 1.4826;

/// Asymptotic efficiency penalty of the median vs. the mean (√(π/2)).
const MEDIAN_SE_FACTOR: f64 = 1.2533;

/// Aggregated latency of one candidate at one position. All times in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandidateStatistic {
    /// Probes measured.
    pub count: usize,
    /// Probes that hit the timeout (included at the timeout value).
    pub timed_out: usize,
    /// Central tendency under the configured aggregation.
    pub center: f64,
    /// Dispersion of the retained samples; `None` with fewer than two.
    pub spread: Option<f64>,
    /// Uncertainty of `center`; `None` with fewer than two retained samples.
    pub standard_error: Option<f64>,
    /// Fastest probe.
    pub min: f64,
    /// Slowest probe.
    pub max: f64,
}

/// Reduce a candidate's samples to a [`CandidateStatistic`].
///
/// Fails with [`Error::InsufficientSamples`] for an empty sample set.
pub fn summarize(samples: &[LatencySample], aggregation: Aggregation) -> Result<CandidateStatistic> {
    if samples.is_empty() {
        return Err(Error::InsufficientSamples { repetitions: 0 });
    }

    let mut secs: Vec<f64> = samples.iter().map(LatencySample::as_secs_f64).collect();
    secs.sort_by(|a, b| a.total_cmp(b));
    let timed_out = samples.iter().filter(|s| s.is_timed_out()).count();
    let min = secs[0];
    let max = secs[secs.len() - 1];

    let (center, spread, standard_error) = match aggregation {
        Aggregation::Mean => mean_with_error(&secs),
        Aggregation::TrimmedMean { fraction } => {
            let (retained, _) = trim_sorted(&secs, fraction);
            mean_with_error(retained)
        }
        Aggregation::Median => {
            let center = compute_quantile(&mut secs.clone(), 0.5);
            if secs.len() < 2 {
                (center, None, None)
            } else {
                let sigma = MAD_TO_SIGMA * median_abs_deviation(&secs, center);
                let se = MEDIAN_SE_FACTOR * sigma / (secs.len() as f64).sqrt();
                (center, Some(sigma), Some(se))
            }
        }
    };

    Ok(CandidateStatistic {
        count: samples.len(),
        timed_out,
        center,
        spread,
        standard_error,
        min,
        max,
    })
}

/// Arithmetic mean.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Sample standard deviation (n - 1 denominator); `None` with fewer than two values.
pub fn std_dev(data: &[f64]) -> Option<f64> {
    if data.len() < 2 {
        return None;
    }
    let m = mean(data);
    let var = data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (data.len() - 1) as f64;
    Some(var.sqrt())
}

fn mean_with_error(data: &[f64]) -> (f64, Option<f64>, Option<f64>) {
    let center = mean(data);
    let spread = std_dev(data);
    let se = spread.map(|s| s / (data.len() as f64).sqrt());
    (center, spread, se)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn ms(values: &[u64]) -> Vec<LatencySample> {
        values
            .iter()
            .map(|&v| LatencySample::Measured(Duration::from_millis(v)))
            .collect()
    }

    #[test]
    fn test_mean_summary() {
        let stat = summarize(&ms(&[1, 2, 3]), Aggregation::Mean).unwrap();
        assert_eq!(stat.count, 3);
        assert!((stat.center - 0.002).abs() < 1e-12);
        assert!((stat.spread.unwrap() - 0.001).abs() < 1e-12);
        assert!((stat.min - 0.001).abs() < 1e-12);
        assert!((stat.max - 0.003).abs() < 1e-12);
    }

    #[test]
    fn test_single_sample_is_valid() {
        let stat = summarize(&ms(&[7]), Aggregation::Mean).unwrap();
        assert_eq!(stat.count, 1);
        assert!((stat.center - 0.007).abs() < 1e-12);
        assert_eq!(stat.spread, None);
        assert_eq!(stat.standard_error, None);

        let stat = summarize(&ms(&[7]), Aggregation::Median).unwrap();
        assert!((stat.center - 0.007).abs() < 1e-12);
    }

    #[test]
    fn test_empty_is_insufficient() {
        assert_eq!(
            summarize(&[], Aggregation::Mean),
            Err(Error::InsufficientSamples { repetitions: 0 })
        );
    }

    #[test]
    fn test_robust_aggregations_ignore_outlier() {
        let samples = ms(&[10, 10, 11, 10, 500]);
        let mean = summarize(&samples, Aggregation::Mean).unwrap().center;
        let trimmed = summarize(&samples, Aggregation::TrimmedMean { fraction: 0.2 })
            .unwrap()
            .center;
        let median = summarize(&samples, Aggregation::Median).unwrap().center;

        assert!(mean > 0.1);
        assert!((trimmed - 0.010333).abs() < 1e-5, "trimmed = {}", trimmed);
        assert!((median - 0.010).abs() < 1e-12);
    }

    #[test]
    fn test_timeouts_counted_at_limit() {
        let limit = Duration::from_millis(50);
        let samples = vec![
            LatencySample::Measured(Duration::from_millis(10)),
            LatencySample::TimedOut { limit },
        ];
        let stat = summarize(&samples, Aggregation::Mean).unwrap();
        assert_eq!(stat.timed_out, 1);
        assert!((stat.max - 0.05).abs() < 1e-12);
        assert!((stat.center - 0.03).abs() < 1e-12);
    }
}
