//! Synthetic oracles with known timing behavior.
//!
//! These are the fixtures the reconstruction is exercised against: a
//! comparison that leaks through early exit, one that does not leak, and a
//! wrapper that adds noise.
//!
//! ```ignore
//! use std::time::Duration;
//! use timing_recovery::helpers::{EarlyExitOracle, Jittered};
//!
//! // 20 ms per matching leading character, plus up to 2 ms of noise.
//! let oracle = Jittered::new(
//!     EarlyExitOracle::new("secret123".chars(), Duration::from_millis(20)),
//!     Duration::from_millis(2),
//! );
//! ```

use std::time::Duration;

use rand::Rng;

use crate::oracle::Oracle;

/// Compares symbol by symbol and stops at the first mismatch.
///
/// Each matching leading symbol costs `per_match`; a mismatch optionally
/// costs `mismatch_delay` before returning. This covers the usual shapes of
/// the leak: a helper call per matched position, a branch that only runs on
/// a match, and a loop that breaks on the first difference.
///
/// The secret stays private. [`validate`](Oracle::validate) answers whether
/// a candidate is exactly the secret only after
/// [`with_validation`](Self::with_validation); otherwise the oracle offers
/// timing alone.
#[derive(Clone)]
pub struct EarlyExitOracle<S> {
    secret: Vec<S>,
    per_match: Duration,
    mismatch_delay: Duration,
    validating: bool,
}

impl<S> std::fmt::Debug for EarlyExitOracle<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EarlyExitOracle")
            .field("secret_len", &self.secret.len())
            .field("per_match", &self.per_match)
            .field("mismatch_delay", &self.mismatch_delay)
            .field("validating", &self.validating)
            .finish()
    }
}

impl<S: PartialEq> EarlyExitOracle<S> {
    /// Oracle guarding `secret`, spending `per_match` on each matched symbol.
    pub fn new<I>(secret: I, per_match: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
    {
        Self {
            secret: secret.into_iter().collect(),
            per_match,
            mismatch_delay: Duration::ZERO,
            validating: false,
        }
    }

    /// Answer full-secret checks through [`Oracle::validate`].
    pub fn with_validation(mut self) -> Self {
        self.validating = true;
        self
    }

    /// Also spend `delay` when the first mismatch is found.
    pub fn mismatch_delay(mut self, delay: Duration) -> Self {
        self.mismatch_delay = delay;
        self
    }

    /// Length of the guarded secret.
    pub fn secret_len(&self) -> usize {
        self.secret.len()
    }
}

impl<S: PartialEq> Oracle<S> for EarlyExitOracle<S> {
    type Output = bool;

    fn probe(&self, candidate: &[S]) -> bool {
        for (i, expected) in self.secret.iter().enumerate() {
            match candidate.get(i) {
                Some(symbol) if symbol == expected => {
                    if !self.per_match.is_zero() {
                        std::thread::sleep(self.per_match);
                    }
                }
                _ => {
                    if !self.mismatch_delay.is_zero() {
                        std::thread::sleep(self.mismatch_delay);
                    }
                    return false;
                }
            }
        }
        candidate.len() == self.secret.len()
    }

    fn validate(&self, candidate: &[S]) -> Option<bool> {
        self.validating.then(|| candidate == self.secret.as_slice())
    }
}

/// Takes the same time for every candidate.
///
/// Compares every position without an early exit and pads the call to a
/// fixed latency.
#[derive(Clone)]
pub struct ConstantTimeOracle<S> {
    secret: Vec<S>,
    latency: Duration,
}

impl<S> std::fmt::Debug for ConstantTimeOracle<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstantTimeOracle")
            .field("secret_len", &self.secret.len())
            .field("latency", &self.latency)
            .finish()
    }
}

impl<S: PartialEq> ConstantTimeOracle<S> {
    /// Oracle guarding `secret`; every probe takes about `latency`.
    pub fn new<I>(secret: I, latency: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
    {
        Self {
            secret: secret.into_iter().collect(),
            latency,
        }
    }
}

impl<S: PartialEq> Oracle<S> for ConstantTimeOracle<S> {
    type Output = bool;

    fn probe(&self, candidate: &[S]) -> bool {
        let mut equal = candidate.len() == self.secret.len();
        for (i, expected) in self.secret.iter().enumerate() {
            equal &= candidate.get(i) == Some(expected);
        }
        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }
        std::hint::black_box(equal)
    }

    fn validate(&self, candidate: &[S]) -> Option<bool> {
        Some(candidate == self.secret.as_slice())
    }
}

/// Adds uniformly random extra latency in `[0, max_jitter)` to every probe.
#[derive(Debug, Clone)]
pub struct Jittered<O> {
    inner: O,
    max_jitter: Duration,
}

impl<O> Jittered<O> {
    /// Wrap `inner`.
    pub fn new(inner: O, max_jitter: Duration) -> Self {
        Self { inner, max_jitter }
    }

    /// The wrapped oracle.
    pub fn inner(&self) -> &O {
        &self.inner
    }

    fn bound_nanos(&self) -> u64 {
        u64::try_from(self.max_jitter.as_nanos()).unwrap_or(u64::MAX)
    }
}

impl<S, O: Oracle<S>> Oracle<S> for Jittered<O> {
    type Output = O::Output;

    fn probe(&self, candidate: &[S]) -> O::Output {
        let output = self.inner.probe(candidate);
        let max = self.bound_nanos();
        if max > 0 {
            let nanos = rand::rng().random_range(0..max);
            std::thread::sleep(Duration::from_nanos(nanos));
        }
        output
    }

    fn validate(&self, candidate: &[S]) -> Option<bool> {
        self.inner.validate(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::measure;

    #[test]
    fn test_early_exit_latency_grows_with_match() {
        let oracle = EarlyExitOracle::new("abc".chars(), Duration::from_millis(3));
        let (_, none) = measure(|| oracle.probe(&['x']));
        let (_, two) = measure(|| oracle.probe(&['a', 'b', 'x']));
        assert!(none < Duration::from_millis(3));
        assert!(two >= Duration::from_millis(6));
    }

    #[test]
    fn test_early_exit_answers() {
        let oracle = EarlyExitOracle::new("ab".chars(), Duration::ZERO);
        assert!(oracle.probe(&['a', 'b']));
        assert!(!oracle.probe(&['a']));
        assert!(!oracle.probe(&['a', 'b', 'c']));
        assert_eq!(oracle.secret_len(), 2);
    }

    #[test]
    fn test_early_exit_validation_is_opt_in() {
        let plain = EarlyExitOracle::new("ab".chars(), Duration::ZERO);
        assert_eq!(plain.validate(&['a', 'b']), None);

        let checked = plain.with_validation();
        assert_eq!(checked.validate(&['a', 'b']), Some(true));
        assert_eq!(checked.validate(&['a']), Some(false));
    }

    #[test]
    fn test_mismatch_delay() {
        let oracle = EarlyExitOracle::new("ab".chars(), Duration::ZERO)
            .mismatch_delay(Duration::from_millis(4));
        let (_, elapsed) = measure(|| oracle.probe(&['z']));
        assert!(elapsed >= Duration::from_millis(4));
    }

    #[test]
    fn test_debug_hides_secret() {
        let oracle = EarlyExitOracle::new("hunter2".chars(), Duration::ZERO);
        let shown = format!("{:?}", oracle);
        assert!(!shown.contains("hunter2"), "{}", shown);
        assert!(shown.contains("secret_len: 7"));
    }

    #[test]
    fn test_constant_time_answers() {
        let oracle = ConstantTimeOracle::new([1u8, 2, 3], Duration::ZERO);
        assert!(oracle.probe(&[1, 2, 3]));
        assert!(!oracle.probe(&[1, 2]));
        assert!(!oracle.probe(&[1, 2, 4]));
        assert_eq!(oracle.validate(&[1, 2, 3]), Some(true));
    }

    #[test]
    fn test_jitter_bounded() {
        let oracle = Jittered::new(|_: &[u8]| 7, Duration::from_micros(500));
        let input: &[u8] = &[0];
        for _ in 0..5 {
            let (value, elapsed) = measure(|| oracle.probe(input));
            assert_eq!(value, 7);
            assert!(elapsed < Duration::from_millis(100));
        }
        assert_eq!(oracle.validate(input), None);
    }

    #[test]
    fn test_huge_jitter_bound_saturates() {
        let oracle = Jittered::new(|_: &[u8]| 1, Duration::MAX);
        assert_eq!(oracle.bound_nanos(), u64::MAX);
        assert_eq!(
            Jittered::new(|_: &[u8]| 1, Duration::from_micros(3)).bound_nanos(),
            3_000
        );
    }
}
