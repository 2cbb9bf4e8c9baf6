//! # timing-recovery
//!
//! Recover a secret from an oracle whose latency depends on how much of a
//! candidate matches it.
//!
//! A comparison that stops at the first mismatching symbol takes longer the
//! more leading symbols are right. This crate turns that into the whole
//! secret: for each position it times every extension of the known prefix,
//! keeps the candidate that stands out by a clear statistical margin, and
//! moves on. A round where nothing stands out is retried with more
//! repetitions and, failing that, reported as a stall instead of guessed.
//!
//! ```text
//! Timer ──> Sampler ──> Distinguisher ──> Reconstructor ──> Reporter
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use timing_recovery::{Alphabet, TimingAttack};
//!
//! let report = TimingAttack::new(Alphabet::lowercase_alphanumeric())
//!     .secret_length(9)
//!     .run(&|candidate: &[char]| check_password(candidate))?;
//!
//! match report.secret_string() {
//!     Some(secret) => println!("recovered {} (weakest margin {:?})", secret, report.confidence()),
//!     None => println!("{}", timing_recovery::output::format_report(&report)),
//! }
//! ```
//!
//! ## Measurement hygiene
//!
//! The oracle call is the only thing inside the timed region. Candidate
//! buffers for a round are built before the first probe, and probes are
//! interleaved across candidates in a shuffled order by default so slow
//! drift on the host does not favor any one symbol.
//!
//! Logging goes through `tracing`; install a subscriber to see per-round
//! decisions.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
mod attack;
mod cancel;
mod campaign;
mod config;
mod error;
mod oracle;
mod reconstructor;
mod result;
mod sampler;
mod thread_pool;
mod types;

// Functional modules
pub mod analysis;
pub mod helpers;
pub mod measurement;
pub mod output;
pub mod preflight;
pub mod statistics;

// Re-exports for public API
pub use analysis::{Consensus, Distinguisher, Selection};
pub use attack::TimingAttack;
pub use campaign::{Campaign, CampaignReport};
pub use cancel::CancellationToken;
pub use config::{Aggregation, Config, Schedule, MAX_STALL_RETRIES, SEED_ENV_VAR};
pub use error::{Error, Result};
pub use measurement::Timer;
pub use oracle::{Oracle, WithValidator};
pub use reconstructor::Reconstructor;
pub use result::{
    AttackReport, CandidateRecord, FailureReason, Metadata, RoundRecord, StallReason, State,
    Trace,
};
pub use sampler::Sampler;
pub use statistics::CandidateStatistic;
pub use types::{Alphabet, LatencySample, Polarity, Symbol};

/// Convenience function: recover a secret of known length with default
/// configuration.
///
/// Equivalent to `TimingAttack::new(alphabet).secret_length(secret_length).run(oracle)`.
///
/// ```ignore
/// let report = timing_recovery::recover(
///     Alphabet::lowercase_alphanumeric(),
///     9,
///     &|candidate: &[char]| check_password(candidate),
/// )?;
/// ```
pub fn recover<S, O>(alphabet: Alphabet<S>, secret_length: usize, oracle: &O) -> Result<AttackReport<S>>
where
    S: Symbol,
    O: Oracle<S>,
{
    TimingAttack::new(alphabet)
        .secret_length(secret_length)
        .run(oracle)
}
