//! Preflight checks on the measurement setup.
//!
//! Run once, on the latencies of the first collected round:
//!
//! - **Resolution**: probes too fast for the clock, or heavily quantized data
//! - **System**: host settings that add latency noise (Linux only)
//!
//! Findings are attached to the report; they never stop a run.

mod resolution;
mod system;

pub use resolution::{resolution_check, ResolutionWarning, MIN_TICKS_PER_PROBE};
pub use system::{system_check, SystemWarning};

use serde::{Deserialize, Serialize};

/// Result of running all preflight checks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreflightResult {
    /// Clock resolution findings.
    pub resolution: Vec<ResolutionWarning>,

    /// Host findings.
    pub system: Vec<SystemWarning>,

    /// Whether any critical warning was found.
    pub has_critical: bool,
}

impl PreflightResult {
    /// Create an empty preflight result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resolution warning.
    pub fn add_resolution_warning(&mut self, warning: ResolutionWarning) {
        if warning.is_critical() {
            self.has_critical = true;
        }
        self.resolution.push(warning);
    }

    /// Add a host warning.
    pub fn add_system_warning(&mut self, warning: SystemWarning) {
        self.system.push(warning);
    }

    /// Total number of warnings.
    pub fn count(&self) -> usize {
        self.resolution.len() + self.system.len()
    }

    /// Check if there are any warnings.
    pub fn has_warnings(&self) -> bool {
        self.count() > 0
    }

    /// Descriptions of every warning, resolution findings first.
    pub fn descriptions(&self) -> Vec<String> {
        self.resolution
            .iter()
            .map(ResolutionWarning::description)
            .chain(self.system.iter().map(SystemWarning::description))
            .collect()
    }
}

/// Run all preflight checks.
///
/// # Arguments
///
/// * `samples_secs` - Latencies of one collected round, in seconds
/// * `timer_resolution_ns` - Estimated clock resolution
pub fn run_all_checks(samples_secs: &[f64], timer_resolution_ns: f64) -> PreflightResult {
    let mut result = PreflightResult::new();

    if let Some(warning) = resolution_check(samples_secs, timer_resolution_ns) {
        result.add_resolution_warning(warning);
    }

    for warning in system_check() {
        result.add_system_warning(warning);
    }

    result
}
