//! Selecting the dominant candidate of a round.
//!
//! The margin is the gap between the best and second-best center, expressed
//! in units of measurement noise. Noise is the largest of three estimates:
//!
//! 1. the pooled standard error of the top two candidates (how well their
//!    own centers are known),
//! 2. the standard deviation of every non-best center (how much wrong
//!    candidates scatter among themselves), and
//! 3. a floor, normally the clock resolution.
//!
//! Taking the largest keeps a lucky draw among many equal candidates from
//! looking like a signal, whether or not per-candidate spreads exist
//! (a single repetition has none).

use serde::{Deserialize, Serialize};

use crate::statistics::{std_dev, CandidateStatistic};
use crate::types::{Polarity, Symbol};

/// Outcome of comparing all candidates of one position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Selection<S> {
    /// One candidate stands out by at least the required margin.
    Winner {
        /// The selected symbol.
        symbol: S,
        /// Normalized margin over the runner-up.
        margin: f64,
    },
    /// No candidate stands out enough.
    Ambiguous {
        /// Best-scoring symbol, if any candidates were supplied.
        best: Option<S>,
        /// Its normalized margin over the runner-up.
        margin: f64,
    },
}

impl<S: Copy> Selection<S> {
    /// The winning symbol, if any.
    pub fn winner(&self) -> Option<S> {
        match self {
            Selection::Winner { symbol, .. } => Some(*symbol),
            Selection::Ambiguous { .. } => None,
        }
    }

    /// The margin of the best candidate.
    pub fn margin(&self) -> f64 {
        match self {
            Selection::Winner { margin, .. } | Selection::Ambiguous { margin, .. } => *margin,
        }
    }
}

/// Picks the statistically dominant candidate, or declines to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Distinguisher {
    polarity: Polarity,
    min_margin: f64,
    noise_floor: f64,
}

impl Distinguisher {
    /// Create a distinguisher requiring at least `min_margin`.
    ///
    /// With `min_margin == 0.0` the extreme candidate always wins, which is
    /// the naive rule and fragile under noise.
    pub fn new(polarity: Polarity, min_margin: f64) -> Self {
        Self {
            polarity,
            min_margin,
            noise_floor: 0.0,
        }
    }

    /// Set the smallest noise level (seconds) a margin is measured against.
    pub fn with_noise_floor(mut self, noise_floor: f64) -> Self {
        self.noise_floor = noise_floor.max(0.0);
        self
    }

    /// The required margin.
    pub fn min_margin(&self) -> f64 {
        self.min_margin
    }

    /// Compare candidates. Ties keep the input order.
    pub fn select<S: Symbol>(&self, stats: &[(S, CandidateStatistic)]) -> Selection<S> {
        if stats.len() < 2 {
            return Selection::Ambiguous {
                best: stats.first().map(|(s, _)| *s),
                margin: 0.0,
            };
        }

        let score = |stat: &CandidateStatistic| self.polarity.score(stat.center);

        // Stable sort: equal scores keep alphabet order.
        let mut ranked: Vec<usize> = (0..stats.len()).collect();
        ranked.sort_by(|&a, &b| score(&stats[b].1).total_cmp(&score(&stats[a].1)));

        let (best_symbol, best) = &stats[ranked[0]];
        let (_, second) = &stats[ranked[1]];
        let gap = (score(best) - score(second)).max(0.0);

        let pooled_se = match (best.standard_error, second.standard_error) {
            (Some(a), Some(b)) => (a * a + b * b).sqrt(),
            _ => 0.0,
        };
        let others: Vec<f64> = ranked[1..].iter().map(|&i| stats[i].1.center).collect();
        let scatter = std_dev(&others).unwrap_or(0.0);
        let noise = pooled_se.max(scatter).max(self.noise_floor);

        let margin = if gap == 0.0 {
            0.0
        } else if noise > 0.0 {
            gap / noise
        } else {
            f64::MAX
        };

        if margin >= self.min_margin {
            Selection::Winner {
                symbol: *best_symbol,
                margin,
            }
        } else {
            Selection::Ambiguous {
                best: Some(*best_symbol),
                margin,
            }
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Noise-free latency that grows with matched length always selects
        /// the true next symbol.
        #[test]
        fn prop_noise_free_selects_true_symbol(
            size in 2usize..64,
            truth_seed in any::<usize>(),
            matched in 0usize..32,
            per_match_us in 1u64..50_000,
        ) {
            let truth = truth_seed % size;
            let per_match = per_match_us as f64 * 1e-6;
            let stats: Vec<(u16, CandidateStatistic)> = (0..size)
                .map(|i| {
                    let matches = matched + usize::from(i == truth);
                    let center = 1e-4 + per_match * matches as f64;
                    (i as u16, CandidateStatistic {
                        count: 3,
                        timed_out: 0,
                        center,
                        spread: Some(0.0),
                        standard_error: Some(0.0),
                        min: center,
                        max: center,
                    })
                })
                .collect();
            let selection = Distinguisher::new(Polarity::SlowerMatches, 3.0)
                .with_noise_floor(1e-9)
                .select(&stats);
            prop_assert_eq!(selection.winner(), Some(truth as u16));
        }
    }
}
