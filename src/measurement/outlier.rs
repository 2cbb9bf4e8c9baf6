//! Symmetric trimming of latency samples.
//!
//! Scheduler preemption, page faults and I/O interference produce rare,
//! very long latencies that dominate a plain mean when the timing signal is
//! small. Trimming discards the same number of samples from both ends so the
//! center estimate is not shifted toward either tail.

/// Statistics about a trimming pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimStats {
    /// Samples before trimming.
    pub total_samples: usize,
    /// Samples kept.
    pub retained_samples: usize,
    /// Samples removed from each end.
    pub trimmed_per_side: usize,
}

impl TrimStats {
    /// Fraction of samples removed (0.0 to 1.0).
    pub fn trimmed_fraction(&self) -> f64 {
        if self.total_samples == 0 {
            0.0
        } else {
            (self.total_samples - self.retained_samples) as f64 / self.total_samples as f64
        }
    }
}

/// Trim `fraction` of the samples from each end of an ascending slice.
///
/// At least one sample is always retained, so a single repetition survives
/// any trim fraction.
///
/// # Arguments
///
/// * `sorted` - Samples in ascending order
/// * `fraction` - Fraction removed per side, clamped to `[0, 0.5)`
pub fn trim_sorted(sorted: &[f64], fraction: f64) -> (&[f64], TrimStats) {
    let n = sorted.len();
    let fraction = fraction.clamp(0.0, 0.5);
    let mut k = (n as f64 * fraction).floor() as usize;
    while k > 0 && n - 2 * k < 1 {
        k -= 1;
    }
    let retained = if n == 0 { sorted } else { &sorted[k..n - k] };

    (
        retained,
        TrimStats {
            total_samples: n,
            retained_samples: retained.len(),
            trimmed_per_side: k,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_removes_both_tails() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 100.0];
        let (kept, stats) = trim_sorted(&data, 0.1);
        assert_eq!(kept, &[2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        assert_eq!(stats.trimmed_per_side, 1);
        assert!((stats.trimmed_fraction() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_trim_keeps_one_sample() {
        let (kept, stats) = trim_sorted(&[5.0], 0.4);
        assert_eq!(kept, &[5.0]);
        assert_eq!(stats.trimmed_per_side, 0);

        let (kept, _) = trim_sorted(&[1.0, 2.0, 3.0], 0.49);
        assert_eq!(kept, &[2.0]);
    }

    #[test]
    fn test_zero_fraction_is_identity() {
        let data = [1.0, 2.0, 3.0];
        let (kept, stats) = trim_sorted(&data, 0.0);
        assert_eq!(kept, &data);
        assert_eq!(stats.trimmed_fraction(), 0.0);
    }

    #[test]
    fn test_empty_input() {
        let (kept, stats) = trim_sorted(&[], 0.2);
        assert!(kept.is_empty());
        assert_eq!(stats.total_samples, 0);
    }
}
