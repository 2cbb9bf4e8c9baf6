//! Repeated timing of a single candidate.

use std::time::Duration;

use crate::config::Aggregation;
use crate::error::{Error, Result};
use crate::measurement::{Prober, Timer};
use crate::statistics::{summarize, CandidateStatistic};
use crate::types::LatencySample;

/// Times one oracle call repeatedly and aggregates the latencies.
///
/// The reconstructor collects whole rounds through a
/// [`Collector`](crate::measurement::Collector) instead; `Sampler` is the
/// building block for measuring a single candidate by hand.
///
/// ```ignore
/// let sampler = Sampler::new(Aggregation::Median);
/// let stat = sampler.sample(|| check_password("sec"), 50)?;
/// println!("median latency: {:.3} ms", stat.center * 1e3);
/// ```
#[derive(Debug, Clone)]
pub struct Sampler {
    timer: Timer,
    aggregation: Aggregation,
    timeout: Option<Duration>,
}

impl Sampler {
    /// Create a sampler with a freshly calibrated timer.
    pub fn new(aggregation: Aggregation) -> Self {
        Self::with_timer(Timer::new(), aggregation)
    }

    /// Create a sampler around an existing timer.
    pub fn with_timer(timer: Timer, aggregation: Aggregation) -> Self {
        Self {
            timer,
            aggregation,
            timeout: None,
        }
    }

    /// Mark calls longer than `timeout` as timed out.
    ///
    /// The call is not interrupted; use an
    /// [`IsolatedProber`](crate::measurement::IsolatedProber) with
    /// [`sample_candidate`](Self::sample_candidate) for a hard limit.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The aggregation in use.
    pub fn aggregation(&self) -> Aggregation {
        self.aggregation
    }

    /// Time `oracle_call` exactly `repetitions` times.
    ///
    /// Fails with [`Error::InsufficientSamples`] if `repetitions` is zero.
    pub fn sample<F, R>(&self, mut oracle_call: F, repetitions: usize) -> Result<CandidateStatistic>
    where
        F: FnMut() -> R,
    {
        if repetitions == 0 {
            return Err(Error::InsufficientSamples { repetitions });
        }
        let mut samples = Vec::with_capacity(repetitions);
        for _ in 0..repetitions {
            let (_, elapsed) = self.timer.measure(&mut oracle_call);
            samples.push(LatencySample::classify(elapsed, self.timeout));
        }
        summarize(&samples, self.aggregation)
    }

    /// Time `candidate` through `prober` exactly `repetitions` times.
    pub fn sample_candidate<S, P>(
        &self,
        prober: &mut P,
        candidate: &[S],
        repetitions: usize,
    ) -> Result<CandidateStatistic>
    where
        P: Prober<S>,
    {
        if repetitions == 0 {
            return Err(Error::InsufficientSamples { repetitions });
        }
        let samples: Vec<LatencySample> = (0..repetitions).map(|_| prober.probe(candidate)).collect();
        summarize(&samples, self.aggregation)
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new(Aggregation::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::InlineProber;
    use std::cell::Cell;

    #[test]
    fn test_invokes_exactly_repetitions() {
        let calls = Cell::new(0usize);
        let sampler = Sampler::new(Aggregation::Mean);
        let stat = sampler.sample(|| calls.set(calls.get() + 1), 17).unwrap();
        assert_eq!(calls.get(), 17);
        assert_eq!(stat.count, 17);
    }

    #[test]
    fn test_zero_repetitions_rejected() {
        let sampler = Sampler::default();
        assert_eq!(
            sampler.sample(|| (), 0),
            Err(Error::InsufficientSamples { repetitions: 0 })
        );
    }

    #[test]
    fn test_single_repetition_is_valid() {
        let sampler = Sampler::new(Aggregation::Median);
        let stat = sampler
            .sample(|| std::thread::sleep(Duration::from_millis(1)), 1)
            .unwrap();
        assert_eq!(stat.count, 1);
        assert!(stat.center >= 0.001);
    }

    #[test]
    fn test_timeout_recorded_not_raised() {
        let sampler = Sampler::new(Aggregation::Mean).timeout(Duration::from_micros(100));
        let stat = sampler
            .sample(|| std::thread::sleep(Duration::from_millis(2)), 3)
            .unwrap();
        assert_eq!(stat.timed_out, 3);
        assert!((stat.center - 0.0001).abs() < 1e-12);
    }

    #[test]
    fn test_repeat_sampling_is_stable() {
        let sampler = Sampler::new(Aggregation::Median);
        let oracle = || std::thread::sleep(Duration::from_millis(2));
        let a = sampler.sample(oracle, 7).unwrap();
        let b = sampler.sample(oracle, 7).unwrap();
        assert!(
            (a.center - b.center).abs() < 0.002,
            "medians drifted: {} vs {}",
            a.center,
            b.center
        );
    }

    #[test]
    fn test_sample_candidate_through_prober() {
        let oracle = |c: &[u8]| std::thread::sleep(Duration::from_micros(200 * c.len() as u64));
        let timer = Timer::new();
        let mut prober = InlineProber::new(&oracle, timer, None);
        let sampler = Sampler::with_timer(timer, Aggregation::Median);
        let stat = sampler.sample_candidate(&mut prober, &[1u8, 2, 3], 5).unwrap();
        assert_eq!(stat.count, 5);
        assert!(stat.center >= 0.0006);
    }
}
