//! Main entry point: configure and run a reconstruction.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{Aggregation, Config, Schedule};
use crate::error::Result;
use crate::measurement::{InlineProber, IsolatedProber, Timer};
use crate::oracle::Oracle;
use crate::reconstructor::Reconstructor;
use crate::result::AttackReport;
use crate::types::{Alphabet, Polarity, Symbol};

/// Recovers a secret from an oracle's timing, one symbol at a time.
///
/// # Example
///
/// ```ignore
/// use timing_recovery::{Alphabet, TimingAttack};
///
/// let report = TimingAttack::new(Alphabet::lowercase_alphanumeric())
///     .secret_length(9)
///     .repetitions(5)
///     .run(&|candidate: &[char]| server.check(candidate))?;
///
/// println!("{:?}", report.secret_string());
/// ```
///
/// For a hard per-probe timeout the oracle must live on another thread; use
/// [`run_isolated`](Self::run_isolated) with an `Arc`.
#[derive(Debug, Clone)]
pub struct TimingAttack<S> {
    alphabet: Alphabet<S>,
    config: Config,
}

impl<S: Symbol> TimingAttack<S> {
    /// Create with default configuration.
    pub fn new(alphabet: Alphabet<S>) -> Self {
        Self {
            alphabet,
            config: Config::default(),
        }
    }

    /// Create with fast configuration for strong, clean leaks.
    ///
    /// Settings:
    /// - 2 repetitions per candidate (vs 5 default)
    /// - 1 retry per ambiguous round (vs 2 default)
    /// - preflight checks disabled
    pub fn quick(alphabet: Alphabet<S>) -> Self {
        Self::new(alphabet).with_config(Config {
            repetitions_per_candidate: 2,
            max_stall_retries: 1,
            preflight: false,
            ..Config::default()
        })
    }

    /// Create with robust configuration for noisy oracles.
    ///
    /// Settings:
    /// - 25 repetitions per candidate (vs 5 default)
    /// - median aggregation (vs mean)
    /// - 2 warmup probes per candidate and round
    /// - 3 retries per ambiguous round, up to 5,000 repetitions
    pub fn thorough(alphabet: Alphabet<S>) -> Self {
        Self::new(alphabet).with_config(Config {
            repetitions_per_candidate: 25,
            aggregation: Aggregation::Median,
            warmup: 2,
            max_stall_retries: 3,
            max_repetitions: 5_000,
            ..Config::default()
        })
    }

    /// Replace the whole configuration.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Set a known secret length.
    pub fn secret_length(mut self, length: usize) -> Self {
        self.config.secret_length = Some(length);
        self
    }

    /// Treat the length as unknown, extending up to `max` symbols.
    pub fn unknown_length(mut self, max: usize) -> Self {
        self.config.secret_length = None;
        self.config.max_secret_length = max;
        self
    }

    /// Set timed probes per candidate per round.
    pub fn repetitions(mut self, n: usize) -> Self {
        self.config.repetitions_per_candidate = n;
        self
    }

    /// Set how repeated latencies are aggregated.
    pub fn aggregation(mut self, aggregation: Aggregation) -> Self {
        self.config.aggregation = aggregation;
        self
    }

    /// Set the minimum normalized margin for accepting a winner.
    ///
    /// `0.0` always accepts the extreme candidate.
    pub fn min_margin(mut self, margin: f64) -> Self {
        self.config.min_margin = margin;
        self
    }

    /// Set which latency direction indicates a match.
    pub fn polarity(mut self, polarity: Polarity) -> Self {
        self.config.polarity = polarity;
        self
    }

    /// Set a per-probe time limit.
    ///
    /// With [`run`](Self::run) the limit only classifies a probe as timed out
    /// after the oracle returns; the caller still waits for the whole call.
    /// Use [`run_isolated`](Self::run_isolated) to stop waiting at the limit.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Set extra attempts at an ambiguous round before stalling.
    ///
    /// At most [`MAX_STALL_RETRIES`](crate::MAX_STALL_RETRIES); larger values
    /// are rejected when the run starts.
    pub fn max_stall_retries(mut self, retries: usize) -> Self {
        self.config.max_stall_retries = retries;
        self
    }

    /// Set the repetition multiplier per retry and its cap.
    pub fn retry_growth(mut self, growth: usize, max_repetitions: usize) -> Self {
        self.config.retry_growth = growth;
        self.config.max_repetitions = max_repetitions;
        self
    }

    /// Set unrecorded warmup probes per candidate and round.
    pub fn warmup(mut self, n: usize) -> Self {
        self.config.warmup = n;
        self
    }

    /// Set the probe ordering within a round.
    pub fn schedule(mut self, schedule: Schedule) -> Self {
        self.config.schedule = schedule;
        self
    }

    /// Fix the interleaving seed for reproducible probe orders.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Enable or disable preflight checks.
    pub fn preflight(mut self, enabled: bool) -> Self {
        self.config.preflight = enabled;
        self
    }

    /// Current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Candidate symbols.
    pub fn alphabet(&self) -> &Alphabet<S> {
        &self.alphabet
    }

    /// Step-wise reconstruction probing `oracle` on the current thread.
    pub fn reconstructor<'o, O>(&self, oracle: &'o O) -> Result<Reconstructor<S, InlineProber<'o, O>>>
    where
        O: Oracle<S>,
    {
        self.config.validate()?;
        let prober = InlineProber::new(oracle, Timer::new(), self.config.timeout);
        Reconstructor::new(self.alphabet.clone(), self.config.clone(), prober)
    }

    /// Step-wise reconstruction probing `oracle` on a worker thread.
    pub fn isolated_reconstructor<O>(
        &self,
        oracle: Arc<O>,
    ) -> Result<Reconstructor<S, IsolatedProber<S, O>>>
    where
        O: Oracle<S> + Send + Sync + 'static,
    {
        self.config.validate()?;
        let prober = IsolatedProber::new(oracle, Timer::new(), self.config.timeout);
        Reconstructor::new(self.alphabet.clone(), self.config.clone(), prober)
    }

    /// Run to a terminal or stalled state.
    ///
    /// Fails only for an invalid configuration; stalls and failures are
    /// reported in [`AttackReport::state`].
    pub fn run<O>(&self, oracle: &O) -> Result<AttackReport<S>>
    where
        O: Oracle<S>,
    {
        let mut recon = self.reconstructor(oracle)?;
        if let Some(limit) = self.config.timeout {
            tracing::warn!(
                ?limit,
                "inline run cannot interrupt a slow oracle; use run_isolated for a hard limit"
            );
        }
        recon.run()?;
        Ok(recon.into_report())
    }

    /// Like [`run`](Self::run), but a probe exceeding the timeout is
    /// abandoned instead of waited for.
    pub fn run_isolated<O>(&self, oracle: Arc<O>) -> Result<AttackReport<S>>
    where
        O: Oracle<S> + Send + Sync + 'static,
    {
        let mut recon = self.isolated_reconstructor(oracle)?;
        recon.run()?;
        Ok(recon.into_report())
    }
}
