//! Round collection: timing every candidate of one position.
//!
//! All candidates are materialized before the first probe so no allocation
//! happens between probes. With the interleaved schedule the probe order is
//! shuffled, spreading slow environmental drift (frequency scaling, cache
//! state, background load) evenly across candidates instead of penalizing
//! whichever candidate happens to be probed last.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::config::Schedule;
use crate::types::LatencySample;

use super::probe::Prober;

/// Latencies gathered for one round, indexed like the candidate list.
#[derive(Debug, Clone, Default)]
pub struct RoundSamples {
    /// `samples[i]` holds every latency measured for candidate `i`.
    pub samples: Vec<Vec<LatencySample>>,
}

impl RoundSamples {
    /// Total probes recorded in the round.
    pub fn total(&self) -> usize {
        self.samples.iter().map(Vec::len).sum()
    }

    /// Probes that hit the time limit.
    pub fn timed_out(&self) -> usize {
        self.samples
            .iter()
            .flatten()
            .filter(|s| s.is_timed_out())
            .count()
    }

    /// All latencies of the round in seconds, in candidate order.
    pub fn flattened_secs(&self) -> Vec<f64> {
        self.samples
            .iter()
            .flatten()
            .map(LatencySample::as_secs_f64)
            .collect()
    }
}

/// Collects latencies for a set of candidates.
#[derive(Debug)]
pub struct Collector {
    schedule: Schedule,
    warmup: usize,
    rng: Xoshiro256PlusPlus,
}

impl Collector {
    /// Create a collector. `seed` fixes the interleaving order.
    pub fn new(schedule: Schedule, warmup: usize, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_os_rng(),
        };
        Self {
            schedule,
            warmup,
            rng,
        }
    }

    /// Probe every candidate `repetitions` times.
    pub fn collect<S, P>(
        &mut self,
        prober: &mut P,
        candidates: &[Vec<S>],
        repetitions: usize,
    ) -> RoundSamples
    where
        P: Prober<S>,
    {
        for candidate in candidates {
            for _ in 0..self.warmup {
                let _ = prober.probe(candidate);
            }
        }

        let order = self.create_schedule(candidates.len(), repetitions);
        let mut samples: Vec<Vec<LatencySample>> = (0..candidates.len())
            .map(|_| Vec::with_capacity(repetitions))
            .collect();

        for index in order {
            let sample = prober.probe(&candidates[index]);
            samples[index].push(sample);
        }

        RoundSamples { samples }
    }

    /// Probe order as candidate indices, each repeated `repetitions` times.
    fn create_schedule(&mut self, candidates: usize, repetitions: usize) -> Vec<usize> {
        match self.schedule {
            Schedule::Sequential => (0..candidates)
                .flat_map(|index| std::iter::repeat(index).take(repetitions))
                .collect(),
            Schedule::Interleaved => {
                let mut order: Vec<usize> = (0..repetitions)
                    .flat_map(|_| 0..candidates)
                    .collect();
                order.shuffle(&mut self.rng);
                order
            }
        }
    }
}
