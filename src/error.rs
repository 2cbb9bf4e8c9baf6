//! Configuration errors.
//!
//! Only problems that make a run impossible before it starts are errors.
//! Everything that happens while probing (timeouts, stalls, cancellation,
//! validation mismatches) is reported as data in the attack report.

use thiserror::Error;

/// Errors returned when a run cannot be set up.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Fewer than one repetition per candidate was requested.
    #[error("insufficient samples: {repetitions} repetitions per candidate (need at least 1)")]
    InsufficientSamples {
        /// The repetition count that was rejected.
        repetitions: usize,
    },

    /// The alphabet cannot separate candidates.
    #[error("alphabet has {size} distinct symbols (need at least 2)")]
    AlphabetTooSmall {
        /// Number of distinct symbols supplied.
        size: usize,
    },

    /// A configuration value is out of range.
    #[error("invalid configuration for `{parameter}`: {reason}")]
    InvalidConfig {
        /// Name of the offending option.
        parameter: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

impl Error {
    pub(crate) fn invalid(parameter: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            parameter,
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
