//! Core value types shared by the engine.

use std::fmt::Debug;
use std::hash::Hash;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A unit of the secret being reconstructed (a character, a byte, ...).
///
/// Blanket-implemented for every small, copyable, hashable value type.
pub trait Symbol: Copy + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> Symbol for T where T: Copy + Eq + Hash + Debug + Send + Sync + 'static {}

/// Ordered, immutable set of candidate symbols.
///
/// Order matters: it is the probing order for sequential schedules and the
/// tie-break order when two candidates score identically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alphabet<S> {
    symbols: Vec<S>,
}

impl<S: Symbol> Alphabet<S> {
    /// Build an alphabet from symbols, dropping duplicates (first occurrence wins).
    ///
    /// Fails with [`Error::AlphabetTooSmall`] if fewer than two distinct
    /// symbols remain, since a single candidate carries no timing contrast.
    pub fn new<I>(symbols: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
    {
        let mut seen = std::collections::HashSet::new();
        let symbols: Vec<S> = symbols.into_iter().filter(|s| seen.insert(*s)).collect();
        if symbols.len() < 2 {
            return Err(Error::AlphabetTooSmall {
                size: symbols.len(),
            });
        }
        Ok(Self { symbols })
    }

    /// Number of symbols.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Always false for a constructed alphabet; present for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Symbols in probing order.
    pub fn as_slice(&self) -> &[S] {
        &self.symbols
    }

    /// Iterate over symbols in probing order.
    pub fn iter(&self) -> impl Iterator<Item = &S> + '_ {
        self.symbols.iter()
    }

    /// Whether `symbol` belongs to the alphabet.
    pub fn contains(&self, symbol: &S) -> bool {
        self.symbols.contains(symbol)
    }
}

impl Alphabet<char> {
    /// Lowercase ASCII letters followed by decimal digits (`a..z`, `0..9`).
    pub fn lowercase_alphanumeric() -> Self {
        Self {
            symbols: ('a'..='z').chain('0'..='9').collect(),
        }
    }

    /// Alphabet made of the characters of `chars`, in order.
    pub fn from_chars(chars: &str) -> Result<Self> {
        Self::new(chars.chars())
    }
}

impl Alphabet<u8> {
    /// All 256 byte values.
    pub fn bytes() -> Self {
        Self {
            symbols: (0..=u8::MAX).collect(),
        }
    }
}

/// Which direction of latency indicates a matching candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Polarity {
    /// The correct candidate runs longest (early-exit comparisons).
    #[default]
    SlowerMatches,
    /// The correct candidate runs shortest.
    FasterMatches,
}

impl Polarity {
    /// Map a latency onto a score where larger always means "more likely correct".
    #[inline]
    pub fn score(self, latency: f64) -> f64 {
        match self {
            Polarity::SlowerMatches => latency,
            Polarity::FasterMatches => -latency,
        }
    }
}

/// One measured oracle invocation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LatencySample {
    /// The probe returned within the time limit.
    Measured(Duration),
    /// The probe exceeded the time limit; `limit` is a lower bound of its latency.
    TimedOut {
        /// The limit that was exceeded.
        limit: Duration,
    },
}

impl LatencySample {
    /// Latency in seconds (the limit for timed-out probes).
    #[inline]
    pub fn as_secs_f64(&self) -> f64 {
        match self {
            LatencySample::Measured(d) => d.as_secs_f64(),
            LatencySample::TimedOut { limit } => limit.as_secs_f64(),
        }
    }

    /// Whether this sample is the timeout sentinel.
    #[inline]
    pub fn is_timed_out(&self) -> bool {
        matches!(self, LatencySample::TimedOut { .. })
    }

    /// Classify a completed measurement against an optional limit.
    #[inline]
    pub fn classify(elapsed: Duration, limit: Option<Duration>) -> Self {
        match limit {
            Some(limit) if elapsed > limit => LatencySample::TimedOut { limit },
            _ => LatencySample::Measured(elapsed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alphabet_dedup_keeps_order() {
        let alphabet = Alphabet::new(['b', 'a', 'b', 'c', 'a']).unwrap();
        assert_eq!(alphabet.as_slice(), &['b', 'a', 'c']);
    }

    #[test]
    fn test_alphabet_too_small() {
        assert_eq!(
            Alphabet::new(['x', 'x']).unwrap_err(),
            Error::AlphabetTooSmall { size: 1 }
        );
        assert!(Alphabet::<u8>::new(std::iter::empty()).is_err());
    }

    #[test]
    fn test_builtin_alphabets() {
        let alnum = Alphabet::lowercase_alphanumeric();
        assert_eq!(alnum.len(), 36);
        assert_eq!(alnum.as_slice()[0], 'a');
        assert_eq!(alnum.as_slice()[35], '9');
        assert_eq!(Alphabet::bytes().len(), 256);
    }

    #[test]
    fn test_polarity_score() {
        assert_eq!(Polarity::SlowerMatches.score(2.0), 2.0);
        assert_eq!(Polarity::FasterMatches.score(2.0), -2.0);
    }

    #[test]
    fn test_classify_timeout() {
        let limit = Duration::from_millis(5);
        assert_eq!(
            LatencySample::classify(Duration::from_millis(6), Some(limit)),
            LatencySample::TimedOut { limit }
        );
        let ok = LatencySample::classify(Duration::from_millis(1), Some(limit));
        assert!(!ok.is_timed_out());
        assert!((ok.as_secs_f64() - 0.001).abs() < 1e-12);
        assert!(!LatencySample::classify(Duration::from_secs(9), None).is_timed_out());
    }
}
