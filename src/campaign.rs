//! Repeated independent reconstructions of the same secret.
//!
//! A single reconstruction trusts every accepted symbol. Running several with
//! different probe orders and taking the most common result catches the
//! occasional round that a burst of noise decided wrongly.

use serde::{Deserialize, Serialize};

use crate::analysis::{consensus, Consensus};
use crate::attack::TimingAttack;
use crate::error::{Error, Result};
use crate::oracle::Oracle;
use crate::result::AttackReport;
use crate::thread_pool;
use crate::types::Symbol;

/// Runs `attempts` independent reconstructions and reports their consensus.
///
/// ```ignore
/// let campaign = Campaign::new(TimingAttack::quick(alphabet).secret_length(8), 5);
/// let report = campaign.run(&oracle)?;
/// if let Some(c) = &report.consensus {
///     println!("{:?} ({:.0}% agreement)", c.secret, c.agreement() * 100.0);
/// }
/// ```
///
/// With the `parallel` feature the attempts run side by side on a shared
/// pool. Probes within one attempt stay strictly sequential, but attempts
/// share the host and perturb each other's timings.
#[derive(Debug, Clone)]
pub struct Campaign<S> {
    attack: TimingAttack<S>,
    attempts: usize,
}

/// Outcome of a [`Campaign`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignReport<S> {
    /// One report per attempt, in attempt order.
    pub attempts: Vec<AttackReport<S>>,
    /// Most frequent completed secret, if any attempt completed.
    pub consensus: Option<Consensus<S>>,
}

impl<S: Symbol> CampaignReport<S> {
    /// Attempts that completed.
    pub fn completed(&self) -> usize {
        self.attempts.iter().filter(|r| r.is_complete()).count()
    }
}

impl<S: Symbol> Campaign<S> {
    /// Create a campaign of `attempts` runs of `attack`.
    pub fn new(attack: TimingAttack<S>, attempts: usize) -> Self {
        Self { attack, attempts }
    }

    /// Number of attempts.
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Run every attempt against `oracle`.
    ///
    /// Attempt `i` uses seed `seed + i` when a seed is configured, so the
    /// whole campaign is reproducible while each attempt sees its own probe
    /// order.
    pub fn run<O>(&self, oracle: &O) -> Result<CampaignReport<S>>
    where
        O: Oracle<S> + Sync,
    {
        if self.attempts == 0 {
            return Err(Error::invalid("attempts", "campaign needs at least one attempt"));
        }
        self.attack.config().validate()?;

        let reports = self.run_attempts(oracle)?;

        let completed: Vec<Vec<S>> = reports
            .iter()
            .filter_map(|r| r.secret().map(<[S]>::to_vec))
            .collect();
        let consensus = consensus(&completed, self.attempts);

        match &consensus {
            Some(c) => tracing::info!(
                attempts = self.attempts,
                completed = completed.len(),
                votes = c.votes,
                "campaign consensus reached"
            ),
            None => tracing::warn!(attempts = self.attempts, "no campaign attempt completed"),
        }

        Ok(CampaignReport {
            attempts: reports,
            consensus,
        })
    }

    fn attack_for(&self, attempt: usize) -> TimingAttack<S> {
        let mut config = self.attack.config().clone();
        config.seed = config.seed.map(|seed| seed.wrapping_add(attempt as u64));
        self.attack.clone().with_config(config)
    }

    #[cfg(not(feature = "parallel"))]
    fn run_attempts<O>(&self, oracle: &O) -> Result<Vec<AttackReport<S>>>
    where
        O: Oracle<S> + Sync,
    {
        thread_pool::install(|| {
            (0..self.attempts)
                .map(|attempt| {
                    tracing::debug!(attempt, "starting campaign attempt");
                    self.attack_for(attempt).run(oracle)
                })
                .collect()
        })
    }

    #[cfg(feature = "parallel")]
    fn run_attempts<O>(&self, oracle: &O) -> Result<Vec<AttackReport<S>>>
    where
        O: Oracle<S> + Sync,
    {
        use rayon::prelude::*;

        thread_pool::install(|| {
            (0..self.attempts)
                .into_par_iter()
                .map(|attempt| {
                    tracing::debug!(attempt, "starting campaign attempt");
                    self.attack_for(attempt).run(oracle)
                })
                .collect()
        })
    }
}
