//! Clock resolution check.
//!
//! Detects probes so fast that the clock can barely see them, and latency
//! data so quantized that candidates collapse onto a handful of values.
//! Either way the distinguisher ends up comparing clock ticks, not the oracle.

use serde::{Deserialize, Serialize};

/// Warning from the resolution check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResolutionWarning {
    /// Typical probe latency is within a few clock ticks.
    ///
    /// Critical: per-symbol differences cannot be resolved.
    InsufficientResolution {
        /// Median probe latency in nanoseconds.
        median_latency_ns: f64,
        /// Estimated clock resolution in nanoseconds.
        timer_resolution_ns: f64,
    },

    /// Few distinct latency values across many probes.
    HighQuantization {
        /// Distinct values observed.
        unique_values: usize,
        /// Probes inspected.
        total_samples: usize,
    },
}

impl ResolutionWarning {
    /// Check if this warning indicates a critical issue.
    pub fn is_critical(&self) -> bool {
        matches!(self, ResolutionWarning::InsufficientResolution { .. })
    }

    /// Get a human-readable description of the warning.
    pub fn description(&self) -> String {
        match self {
            ResolutionWarning::InsufficientResolution {
                median_latency_ns,
                timer_resolution_ns,
            } => format!(
                "CRITICAL: probes take ~{:.0}ns but the clock resolves only ~{:.0}ns; \
                 per-symbol latency differences will be lost in quantization",
                median_latency_ns, timer_resolution_ns
            ),
            ResolutionWarning::HighQuantization {
                unique_values,
                total_samples,
            } => format!(
                "Only {} distinct latencies in {} probes; clock quantization may mask the signal",
                unique_values, total_samples
            ),
        }
    }
}

/// Probes shorter than this many clock ticks are considered unresolvable.
pub const MIN_TICKS_PER_PROBE: f64 = 5.0;

/// Minimum distinct values expected per 100 probes.
const MIN_UNIQUE_PER_100: usize = 5;

/// Inspect one round of latencies.
///
/// # Arguments
///
/// * `samples_secs` - Probe latencies in seconds
/// * `timer_resolution_ns` - Estimated clock resolution
pub fn resolution_check(samples_secs: &[f64], timer_resolution_ns: f64) -> Option<ResolutionWarning> {
    if samples_secs.is_empty() {
        return None;
    }

    let mut sorted: Vec<f64> = samples_secs.iter().map(|s| s * 1e9).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let median_latency_ns = sorted[sorted.len() / 2];
    if median_latency_ns < timer_resolution_ns * MIN_TICKS_PER_PROBE {
        return Some(ResolutionWarning::InsufficientResolution {
            median_latency_ns,
            timer_resolution_ns,
        });
    }

    if sorted.len() < 100 {
        return None;
    }

    // Values closer than half a tick are the same reading.
    let tolerance = (timer_resolution_ns / 2.0).max(0.1);
    let mut unique_values = 1;
    let mut last = sorted[0];
    for &value in &sorted[1..] {
        if value - last > tolerance {
            unique_values += 1;
            last = value;
        }
    }

    let expected = sorted.len() * MIN_UNIQUE_PER_100 / 100;
    (unique_values < expected).then_some(ResolutionWarning::HighQuantization {
        unique_values,
        total_samples: sorted.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_good_resolution() {
        let samples: Vec<f64> = (0..1000).map(|x| 1e-3 + x as f64 * 1e-8).collect();
        assert!(resolution_check(&samples, 30.0).is_none());
    }

    #[test]
    fn test_insufficient_resolution() {
        let samples = vec![40e-9; 200];
        let warning = resolution_check(&samples, 41.0).expect("should warn");
        assert!(warning.is_critical());
        assert!(warning.description().contains("CRITICAL"));
    }

    #[test]
    fn test_high_quantization() {
        let samples: Vec<f64> = (0..1000).map(|x| 1e-3 + (x % 3) as f64 * 1e-6).collect();
        let warning = resolution_check(&samples, 20.0).expect("should warn");
        assert!(!warning.is_critical());
        assert_eq!(
            warning,
            ResolutionWarning::HighQuantization {
                unique_values: 3,
                total_samples: 1000
            }
        );
    }

    #[test]
    fn test_empty_is_silent() {
        assert!(resolution_check(&[], 1.0).is_none());
    }
}
