//! Measurement infrastructure.
//!
//! This module provides:
//! - A monotonic-clock [`Timer`] around single oracle calls
//! - Probe executors: inline, or isolated on a worker thread with a hard timeout
//! - Round collection with randomized interleaving of candidates
//! - Symmetric trimming for robust aggregation
//!
//! # Measurement purity
//!
//! Probes are strictly sequential. Concurrent probes would share CPU, cache
//! and scheduler state and corrupt the signal being measured, so even the
//! isolated executor keeps exactly one probe in flight.

mod collector;
mod outlier;
mod probe;
mod timer;

pub use collector::{Collector, RoundSamples};
pub use outlier::{trim_sorted, TrimStats};
pub use probe::{InlineProber, IsolatedProber, Prober};
pub use timer::{black_box, measure, Timer};
