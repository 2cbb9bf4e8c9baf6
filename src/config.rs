//! Configuration for secret reconstruction.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::Polarity;

/// Largest accepted [`Config::max_stall_retries`].
pub const MAX_STALL_RETRIES: usize = 1_000;

/// Environment variable that overrides [`Config::seed`] when set to a `u64`.
pub const SEED_ENV_VAR: &str = "TIMING_RECOVERY_SEED";

/// Configuration options for [`TimingAttack`](crate::TimingAttack).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Known secret length. `None` means unknown: extend until no signal
    /// remains, the validator accepts, or `max_secret_length` is reached.
    pub secret_length: Option<usize>,

    /// Upper bound on rounds when `secret_length` is unknown (default: 64).
    pub max_secret_length: usize,

    /// Timed probes per candidate per round (default: 5).
    pub repetitions_per_candidate: usize,

    /// How repeated latencies are reduced to one statistic (default: Mean).
    pub aggregation: Aggregation,

    /// Minimum normalized margin for accepting a winner (default: 3.0).
    ///
    /// `0.0` reproduces the naive "always take the extreme" rule.
    pub min_margin: f64,

    /// Which latency direction indicates a match (default: slower).
    pub polarity: Polarity,

    /// Per-probe time limit (default: none).
    pub timeout: Option<Duration>,

    /// Extra attempts at an ambiguous round before stalling (default: 2).
    pub max_stall_retries: usize,

    /// Repetition multiplier applied on every retry (default: 2).
    pub retry_growth: usize,

    /// Cap on repetitions after retry escalation (default: 1,000).
    pub max_repetitions: usize,

    /// Unrecorded probes per candidate before each round (default: 0).
    pub warmup: usize,

    /// Probe ordering within a round (default: Interleaved).
    pub schedule: Schedule,

    /// Seed for the interleaving RNG (default: none, or `TIMING_RECOVERY_SEED`).
    pub seed: Option<u64>,

    /// Run resolution and host checks after the first round (default: true).
    pub preflight: bool,
}

/// Reduction of one candidate's repeated latencies.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Aggregation {
    /// Arithmetic mean.
    #[default]
    Mean,
    /// Mean after discarding `fraction` of samples from each end.
    TrimmedMean {
        /// Fraction trimmed per side, in `[0, 0.5)`.
        fraction: f64,
    },
    /// Median.
    Median,
}

/// Order in which a round's probes are issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Schedule {
    /// Every (candidate, repetition) pair shuffled, so slow drift in the
    /// environment spreads evenly over candidates.
    #[default]
    Interleaved,
    /// All repetitions of one candidate, then the next, in alphabet order.
    Sequential,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            secret_length: None,
            max_secret_length: 64,
            repetitions_per_candidate: 5,
            aggregation: Aggregation::Mean,
            min_margin: 3.0,
            polarity: Polarity::SlowerMatches,
            timeout: None,
            max_stall_retries: 2,
            retry_growth: 2,
            max_repetitions: 1_000,
            warmup: 0,
            schedule: Schedule::Interleaved,
            seed: seed_from_env(),
            preflight: true,
        }
    }
}

impl Config {
    /// Validate the configuration.
    ///
    /// Called before any probe is issued; a run never starts with an
    /// invalid configuration.
    pub fn validate(&self) -> Result<()> {
        if self.repetitions_per_candidate == 0 {
            return Err(Error::InsufficientSamples {
                repetitions: self.repetitions_per_candidate,
            });
        }
        if self.max_repetitions < self.repetitions_per_candidate {
            return Err(Error::invalid(
                "max_repetitions",
                "must be at least repetitions_per_candidate",
            ));
        }
        if self.max_stall_retries > MAX_STALL_RETRIES {
            return Err(Error::invalid(
                "max_stall_retries",
                format!(
                    "must be at most {}, got {}",
                    MAX_STALL_RETRIES, self.max_stall_retries
                ),
            ));
        }
        if self.retry_growth == 0 {
            return Err(Error::invalid("retry_growth", "must be positive"));
        }
        if !self.min_margin.is_finite() || self.min_margin < 0.0 {
            return Err(Error::invalid(
                "min_margin",
                format!("must be finite and non-negative, got {}", self.min_margin),
            ));
        }
        if let Aggregation::TrimmedMean { fraction } = self.aggregation {
            if !(0.0..0.5).contains(&fraction) {
                return Err(Error::invalid(
                    "aggregation",
                    format!("trim fraction must be in [0, 0.5), got {}", fraction),
                ));
            }
        }
        if self.timeout == Some(Duration::ZERO) {
            return Err(Error::invalid("timeout", "must be non-zero"));
        }
        if self.secret_length.is_none() && self.max_secret_length == 0 {
            return Err(Error::invalid(
                "max_secret_length",
                "must be positive when secret_length is unknown",
            ));
        }
        Ok(())
    }

    /// Number of rounds this configuration allows at most.
    pub fn round_limit(&self) -> usize {
        self.secret_length.unwrap_or(self.max_secret_length)
    }

    /// Repetitions used on retry number `attempt` (0 = first attempt).
    pub fn repetitions_for_attempt(&self, attempt: usize) -> usize {
        let mut reps = self.repetitions_per_candidate;
        for _ in 0..attempt {
            reps = reps.saturating_mul(self.retry_growth);
        }
        reps.min(self.max_repetitions)
    }
}

fn seed_from_env() -> Option<u64> {
    std::env::var(SEED_ENV_VAR)
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
}
