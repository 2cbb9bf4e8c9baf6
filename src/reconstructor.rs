//! The round loop: measure every extension of the prefix, pick a winner,
//! extend, repeat.
//!
//! ```text
//!            ┌──────── Winner ────────┐
//!            ▼                        │
//!      InProgress ── round ──> Distinguisher
//!        │   ▲                        │
//!        │   └── resume ── Stalled <──┘ Ambiguous after all retries
//!        │
//!        ├─ length reached ─> Complete (or Failed: ValidationMismatch)
//!        └─ cancelled ──────> Failed: Cancelled
//! ```
//!
//! Accepted symbols are never revisited.

use std::time::{Duration, Instant};

use crate::analysis::{Distinguisher, Selection};
use crate::cancel::CancellationToken;
use crate::config::Config;
use crate::error::Result;
use crate::measurement::{Collector, Prober};
use crate::preflight::{run_all_checks, PreflightResult};
use crate::result::{
    AttackReport, CandidateRecord, FailureReason, Metadata, RoundRecord, StallReason, State, Trace,
};
use crate::statistics::{summarize, CandidateStatistic};
use crate::types::{Alphabet, Symbol};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    InProgress,
    Stalled(StallReason),
    Complete,
    Failed(FailureReason),
}

/// Stateful reconstruction of one secret.
///
/// Owns the prefix and trace exclusively. Built by
/// [`TimingAttack::reconstructor`](crate::TimingAttack::reconstructor) or
/// [`TimingAttack::isolated_reconstructor`](crate::TimingAttack::isolated_reconstructor).
///
/// ```ignore
/// let mut recon = TimingAttack::new(Alphabet::lowercase_alphanumeric())
///     .secret_length(9)
///     .reconstructor(&oracle)?;
///
/// while recon.run()?.is_stalled() {
///     let reps = recon.config().repetitions_per_candidate;
///     recon.config_mut().repetitions_per_candidate = reps * 4;
///     recon.config_mut().max_repetitions = reps * 64;
///     recon.resume();
/// }
/// ```
#[derive(Debug)]
pub struct Reconstructor<S, P> {
    alphabet: Alphabet<S>,
    config: Config,
    prober: P,
    collector: Collector,
    cancel: CancellationToken,
    prefix: Vec<S>,
    trace: Trace<S>,
    ambiguous: Vec<RoundRecord<S>>,
    phase: Phase,
    probes: usize,
    timed_out_probes: usize,
    collection_rounds: usize,
    elapsed: Duration,
    preflight: Option<PreflightResult>,
}

impl<S, P> Reconstructor<S, P>
where
    S: Symbol,
    P: Prober<S>,
{
    /// Create a reconstructor. Fails if `config` is invalid.
    pub fn new(alphabet: Alphabet<S>, config: Config, prober: P) -> Result<Self> {
        config.validate()?;
        let collector = Collector::new(config.schedule, config.warmup, config.seed);
        Ok(Self {
            alphabet,
            config,
            prober,
            collector,
            cancel: CancellationToken::new(),
            prefix: Vec::new(),
            trace: Trace::new(),
            ambiguous: Vec::new(),
            phase: Phase::InProgress,
            probes: 0,
            timed_out_probes: 0,
            collection_rounds: 0,
            elapsed: Duration::ZERO,
            preflight: None,
        })
    }

    /// Use an externally owned cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that cancels this reconstruction at the next round boundary.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Mutable configuration, for adjusting a stalled run before
    /// [`resume`](Self::resume). Re-validated before the next round.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Candidate symbols.
    pub fn alphabet(&self) -> &Alphabet<S> {
        &self.alphabet
    }

    /// Symbols confirmed so far.
    pub fn prefix(&self) -> &[S] {
        &self.prefix
    }

    /// Decided rounds so far.
    pub fn trace(&self) -> &Trace<S> {
        &self.trace
    }

    /// Current state.
    pub fn state(&self) -> State<S> {
        let prefix = self.prefix.clone();
        match self.phase {
            Phase::InProgress => State::InProgress { prefix },
            Phase::Stalled(reason) => State::Stalled { prefix, reason },
            Phase::Complete => State::Complete { prefix },
            Phase::Failed(reason) => State::Failed { prefix, reason },
        }
    }

    /// Turn a stalled reconstruction back into an in-progress one.
    ///
    /// Returns `false` (and changes nothing) unless the state is `Stalled`.
    pub fn resume(&mut self) -> bool {
        if let Phase::Stalled(_) = self.phase {
            tracing::info!(position = self.prefix.len(), "resuming stalled reconstruction");
            self.phase = Phase::InProgress;
            true
        } else {
            false
        }
    }

    /// Run rounds until the state is no longer `InProgress`.
    pub fn run(&mut self) -> Result<State<S>> {
        loop {
            let state = self.step()?;
            if !matches!(state, State::InProgress { .. }) {
                return Ok(state);
            }
        }
    }

    /// Decide at most one position.
    ///
    /// Runs up to `max_stall_retries + 1` collection rounds at the current
    /// position, escalating repetitions after each ambiguous one. Does
    /// nothing unless the state is `InProgress`.
    pub fn step(&mut self) -> Result<State<S>> {
        if self.phase != Phase::InProgress {
            return Ok(self.state());
        }
        self.config.validate()?;

        if self.cancel.is_cancelled() {
            return Ok(self.fail(FailureReason::Cancelled));
        }
        if self.prefix.len() >= self.config.round_limit() {
            return Ok(self.finish());
        }
        if self.config.secret_length.is_none()
            && !self.prefix.is_empty()
            && self.prober.validate(&self.prefix) == Some(true)
        {
            return Ok(self.finish());
        }

        let position = self.prefix.len();
        let candidates: Vec<Vec<S>> = self
            .alphabet
            .iter()
            .map(|&symbol| {
                let mut candidate = Vec::with_capacity(position + 1);
                candidate.extend_from_slice(&self.prefix);
                candidate.push(symbol);
                candidate
            })
            .collect();

        let distinguisher = Distinguisher::new(self.config.polarity, self.config.min_margin)
            .with_noise_floor(self.prober.timer().resolution().as_secs_f64());

        let attempts = self.config.max_stall_retries.saturating_add(1);
        let mut last_margin = 0.0;
        let mut last_repetitions = self.config.repetitions_per_candidate;

        for attempt in 0..attempts {
            if attempt > 0 && self.cancel.is_cancelled() {
                return Ok(self.fail(FailureReason::Cancelled));
            }

            let repetitions = self.config.repetitions_for_attempt(attempt);
            let record = self.collect_round(position, attempt, repetitions, &candidates, &distinguisher)?;
            last_repetitions = repetitions;

            match record.selection {
                Selection::Winner { symbol, margin } => {
                    tracing::debug!(
                        position,
                        attempt,
                        repetitions,
                        margin,
                        "accepted {:?}",
                        symbol
                    );
                    self.prefix.push(symbol);
                    self.trace.push(record);
                    debug_assert_eq!(self.trace.len(), self.prefix.len());

                    if self.prefix.len() >= self.config.round_limit() {
                        return Ok(self.finish());
                    }
                    return Ok(self.state());
                }
                Selection::Ambiguous { best, margin } => {
                    tracing::debug!(
                        position,
                        attempt,
                        repetitions,
                        margin,
                        "ambiguous round (best {:?})",
                        best
                    );
                    last_margin = margin;
                    self.ambiguous.push(record);
                }
            }
        }

        if self.config.secret_length.is_none() && !self.prefix.is_empty() {
            tracing::info!(
                position,
                "no candidate stands out; treating the secret as {} symbols long",
                self.prefix.len()
            );
            return Ok(self.finish());
        }

        let reason = StallReason::Ambiguous {
            position,
            margin: last_margin,
            attempts,
            repetitions: last_repetitions,
        };
        tracing::warn!(
            position,
            attempts,
            margin = last_margin,
            "reconstruction stalled: no candidate exceeds min_margin {}",
            self.config.min_margin
        );
        self.phase = Phase::Stalled(reason);
        Ok(self.state())
    }

    /// Consume the reconstructor and produce its report.
    pub fn into_report(self) -> AttackReport<S> {
        let state = self.state();
        let metadata = Metadata {
            timer_resolution_ns: self.prober.timer().resolution().as_secs_f64() * 1e9,
            probes: self.probes,
            timed_out_probes: self.timed_out_probes,
            abandoned_probes: self.prober.abandoned_probes(),
            collection_rounds: self.collection_rounds,
            ambiguous_rounds: self.ambiguous.len(),
            runtime_secs: self.elapsed.as_secs_f64(),
            preflight: self.preflight,
        };
        AttackReport {
            state,
            trace: self.trace,
            ambiguous: self.ambiguous,
            metadata,
            config: self.config,
        }
    }

    fn collect_round(
        &mut self,
        position: usize,
        attempt: usize,
        repetitions: usize,
        candidates: &[Vec<S>],
        distinguisher: &Distinguisher,
    ) -> Result<RoundRecord<S>> {
        let started = Instant::now();
        let round = self.collector.collect(&mut self.prober, candidates, repetitions);
        self.elapsed += started.elapsed();

        self.collection_rounds += 1;
        self.probes += round.total();
        let timed_out = round.timed_out();
        if timed_out > 0 {
            tracing::warn!(position, timed_out, "probes exceeded the timeout");
        }
        self.timed_out_probes += timed_out;

        if self.config.preflight && self.preflight.is_none() {
            let resolution_ns = self.prober.timer().resolution().as_secs_f64() * 1e9;
            let preflight = run_all_checks(&round.flattened_secs(), resolution_ns);
            for description in preflight.descriptions() {
                tracing::warn!("preflight: {}", description);
            }
            self.preflight = Some(preflight);
        }

        let stats = self
            .alphabet
            .iter()
            .zip(&round.samples)
            .map(|(&symbol, samples)| {
                summarize(samples, self.config.aggregation).map(|stat| (symbol, stat))
            })
            .collect::<Result<Vec<(S, CandidateStatistic)>>>()?;

        let selection = distinguisher.select(&stats);
        let candidates = stats
            .into_iter()
            .map(|(symbol, statistic)| CandidateRecord { symbol, statistic })
            .collect();

        Ok(RoundRecord {
            position,
            attempt,
            repetitions,
            candidates,
            selection,
        })
    }

    /// Validate the assembled prefix and enter a terminal state.
    fn finish(&mut self) -> State<S> {
        match self.prober.validate(&self.prefix) {
            Some(false) => {
                tracing::warn!(
                    length = self.prefix.len(),
                    "oracle rejected the reconstruction; leakage is not position-independent"
                );
                self.phase = Phase::Failed(FailureReason::ValidationMismatch);
            }
            validated => {
                tracing::info!(
                    length = self.prefix.len(),
                    validated = validated.is_some(),
                    weakest_margin = self.trace.weakest_margin(),
                    "reconstruction complete"
                );
                self.phase = Phase::Complete;
            }
        }
        self.state()
    }

    fn fail(&mut self, reason: FailureReason) -> State<S> {
        tracing::info!(position = self.prefix.len(), "reconstruction failed: {:?}", reason);
        self.phase = Phase::Failed(reason);
        self.state()
    }
}
