//! Reconstruction states, the round trace, and the final report.

use serde::{Deserialize, Serialize};

use crate::analysis::Selection;
use crate::config::Config;
use crate::preflight::PreflightResult;
use crate::statistics::CandidateStatistic;

/// Where a reconstruction stands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum State<S> {
    /// Rounds remain to be run.
    InProgress {
        /// Symbols confirmed so far.
        prefix: Vec<S>,
    },
    /// No candidate stood out after all retries. Recoverable: adjust the
    /// configuration and [`resume`](crate::Reconstructor::resume).
    Stalled {
        /// Symbols confirmed before the stall.
        prefix: Vec<S>,
        /// Why the round could not be decided.
        reason: StallReason,
    },
    /// The full secret length was reconstructed.
    Complete {
        /// The reconstructed secret.
        prefix: Vec<S>,
    },
    /// Terminal failure.
    Failed {
        /// Symbols confirmed before the failure.
        prefix: Vec<S>,
        /// What went wrong.
        reason: FailureReason,
    },
}

impl<S> State<S> {
    /// Symbols confirmed so far, whatever the state.
    pub fn prefix(&self) -> &[S] {
        match self {
            State::InProgress { prefix }
            | State::Stalled { prefix, .. }
            | State::Complete { prefix }
            | State::Failed { prefix, .. } => prefix,
        }
    }

    /// `Complete` or `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, State::Complete { .. } | State::Failed { .. })
    }

    /// Whether the reconstruction completed.
    pub fn is_complete(&self) -> bool {
        matches!(self, State::Complete { .. })
    }

    /// Whether the reconstruction stalled.
    pub fn is_stalled(&self) -> bool {
        matches!(self, State::Stalled { .. })
    }

    /// Short label for logs and reports.
    pub fn label(&self) -> &'static str {
        match self {
            State::InProgress { .. } => "in progress",
            State::Stalled { .. } => "stalled",
            State::Complete { .. } => "complete",
            State::Failed { .. } => "failed",
        }
    }
}

/// Why a round could not be decided.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StallReason {
    /// Every attempt at the round was ambiguous.
    Ambiguous {
        /// Zero-based position that could not be decided.
        position: usize,
        /// Best margin seen on the final attempt.
        margin: f64,
        /// Attempts made, including the first.
        attempts: usize,
        /// Repetitions per candidate on the final attempt.
        repetitions: usize,
    },
}

/// Why a reconstruction failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    /// Cancellation was requested between rounds.
    Cancelled,
    /// The oracle's own check rejected the assembled secret. The timing does
    /// not leak each position independently for this oracle.
    ValidationMismatch,
}

/// One candidate's statistic within a round.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord<S> {
    /// The symbol appended to the prefix.
    pub symbol: S,
    /// Its aggregated latency.
    pub statistic: CandidateStatistic,
}

/// Everything measured and decided for one attempt at one position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord<S> {
    /// Zero-based position in the secret.
    pub position: usize,
    /// Attempt number at this position (0 = first try).
    pub attempt: usize,
    /// Repetitions per candidate.
    pub repetitions: usize,
    /// Per-candidate statistics in alphabet order.
    pub candidates: Vec<CandidateRecord<S>>,
    /// The distinguisher's decision.
    pub selection: Selection<S>,
}

impl<S: Copy + PartialEq> RoundRecord<S> {
    /// The accepted symbol, if the round was decided.
    pub fn winner(&self) -> Option<S> {
        self.selection.winner()
    }

    /// Normalized margin of the best candidate.
    pub fn margin(&self) -> f64 {
        self.selection.margin()
    }

    /// Statistic recorded for `symbol`.
    pub fn statistic_for(&self, symbol: S) -> Option<&CandidateStatistic> {
        self.candidates
            .iter()
            .find(|c| c.symbol == symbol)
            .map(|c| &c.statistic)
    }
}

/// Append-only log of decided rounds; one entry per confirmed symbol.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Trace<S> {
    rounds: Vec<RoundRecord<S>>,
}

impl<S: Copy + PartialEq> Trace<S> {
    pub(crate) fn new() -> Self {
        Self { rounds: Vec::new() }
    }

    pub(crate) fn push(&mut self, record: RoundRecord<S>) {
        debug_assert!(record.winner().is_some(), "trace only holds decided rounds");
        self.rounds.push(record);
    }

    /// Number of decided rounds.
    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    /// Whether no round has been decided.
    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    /// Decided rounds in position order.
    pub fn rounds(&self) -> &[RoundRecord<S>] {
        &self.rounds
    }

    /// Iterate over decided rounds.
    pub fn iter(&self) -> impl Iterator<Item = &RoundRecord<S>> + '_ {
        self.rounds.iter()
    }

    /// Smallest accepted margin: the weakest link of the reconstruction.
    pub fn weakest_margin(&self) -> Option<f64> {
        self.rounds.iter().map(RoundRecord::margin).min_by(f64::total_cmp)
    }

    /// Symbols in the order they were accepted.
    pub fn symbols(&self) -> Vec<S> {
        self.rounds.iter().filter_map(RoundRecord::winner).collect()
    }
}

/// Measurement bookkeeping for a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Estimated clock resolution in nanoseconds.
    pub timer_resolution_ns: f64,
    /// Timed probes issued (warmup excluded).
    pub probes: usize,
    /// Probes recorded as timed out.
    pub timed_out_probes: usize,
    /// Hung probes whose worker thread was abandoned.
    pub abandoned_probes: usize,
    /// Rounds collected, including retries.
    pub collection_rounds: usize,
    /// Rounds that were ambiguous.
    pub ambiguous_rounds: usize,
    /// Wall time spent in rounds, in seconds.
    pub runtime_secs: f64,
    /// Resolution and host checks, if enabled.
    pub preflight: Option<PreflightResult>,
}

/// Final result of a reconstruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackReport<S> {
    /// Final state.
    pub state: State<S>,
    /// Decided rounds, one per confirmed symbol.
    pub trace: Trace<S>,
    /// Ambiguous attempts, kept for diagnostics.
    pub ambiguous: Vec<RoundRecord<S>>,
    /// Measurement bookkeeping.
    pub metadata: Metadata,
    /// Configuration at the end of the run.
    pub config: Config,
}

impl<S: Copy + PartialEq> AttackReport<S> {
    /// The reconstructed secret, only if the run completed.
    pub fn secret(&self) -> Option<&[S]> {
        match &self.state {
            State::Complete { prefix } => Some(prefix),
            _ => None,
        }
    }

    /// Whether the run completed.
    pub fn is_complete(&self) -> bool {
        self.state.is_complete()
    }

    /// Confidence indicator: the weakest accepted margin.
    pub fn confidence(&self) -> Option<f64> {
        self.trace.weakest_margin()
    }
}

impl AttackReport<char> {
    /// The reconstructed secret as a string, only if the run completed.
    pub fn secret_string(&self) -> Option<String> {
        self.secret().map(|s| s.iter().collect())
    }
}
