//! Monotonic latency measurement around a single call.
//!
//! Uses `std::time::Instant`, which is backed by a monotonic clock on every
//! supported platform, so wall-clock adjustments never skew a sample.

use std::hint::black_box as std_black_box;
use std::time::{Duration, Instant};

/// Wrapper around `std::hint::black_box` for preventing compiler optimizations.
///
/// Keeps the oracle's result alive so the call cannot be elided or moved
/// across the clock reads.
#[inline]
pub fn black_box<T>(x: T) -> T {
    std_black_box(x)
}

/// Measure one invocation of `f`.
///
/// Invokes `f` exactly once. Nothing between the two clock reads depends on
/// the input, so the overhead is the same for every candidate.
#[inline]
pub fn measure<F, R>(f: F) -> (R, Duration)
where
    F: FnOnce() -> R,
{
    let start = Instant::now();
    let out = black_box(f());
    let elapsed = start.elapsed();
    (out, elapsed)
}

/// Smallest non-zero step observed between consecutive clock reads.
fn measure_clock_resolution() -> Duration {
    let mut min_step = Duration::MAX;

    for _ in 0..1000 {
        let t1 = Instant::now();
        let mut t2 = Instant::now();
        // Spin until the clock ticks; bounded so a frozen clock cannot hang us.
        let mut spins = 0;
        while t2 == t1 && spins < 10_000 {
            t2 = Instant::now();
            spins += 1;
        }
        let step = t2.saturating_duration_since(t1);
        if !step.is_zero() && step < min_step {
            min_step = step;
        }
    }

    if min_step == Duration::MAX {
        Duration::from_nanos(1)
    } else {
        min_step
    }
}

/// Latency timer with a calibrated resolution estimate.
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    resolution: Duration,
}

impl Timer {
    /// Create a timer, estimating the clock resolution.
    pub fn new() -> Self {
        Self {
            resolution: measure_clock_resolution(),
        }
    }

    /// Create a timer with a known resolution (skips calibration).
    pub fn with_resolution(resolution: Duration) -> Self {
        Self { resolution }
    }

    /// Estimated clock resolution.
    ///
    /// Latency differences below this are indistinguishable from quantization.
    pub fn resolution(&self) -> Duration {
        self.resolution
    }

    /// Measure one invocation of `f`, returning its result and latency.
    #[inline]
    pub fn measure<F, R>(&self, f: F) -> (R, Duration)
    where
        F: FnOnce() -> R,
    {
        measure(f)
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
