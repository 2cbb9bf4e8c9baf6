//! The black-box function under attack.
//!
//! The engine only ever sees an oracle through this trait: it submits
//! candidates and times the calls. The secret itself stays private to the
//! implementation.

/// A function whose latency depends on how much of a candidate matches a
/// hidden secret.
///
/// Repeated probes with the same candidate are assumed to be i.i.d. draws
/// from one latency distribution. How the probe is carried out (local call,
/// network request, subprocess) is up to the implementation.
///
/// Any `Fn(&[S]) -> R` closure is an oracle:
///
/// ```ignore
/// let oracle = |candidate: &[char]| check_password(candidate);
/// ```
pub trait Oracle<S> {
    /// Whatever the probe returns; the engine ignores it beyond keeping it
    /// alive until the clock stops.
    type Output;

    /// Submit a candidate.
    fn probe(&self, candidate: &[S]) -> Self::Output;

    /// Independent check of a fully assembled candidate, if the oracle can
    /// answer "is this the whole secret".
    ///
    /// `None` (the default) means no such check exists.
    fn validate(&self, _candidate: &[S]) -> Option<bool> {
        None
    }
}

impl<S, F, R> Oracle<S> for F
where
    F: Fn(&[S]) -> R,
{
    type Output = R;

    #[inline]
    fn probe(&self, candidate: &[S]) -> R {
        self(candidate)
    }
}

/// An oracle paired with a separate full-secret check.
///
/// ```ignore
/// let oracle = WithValidator::new(
///     |c: &[char]| check_password(c),
///     |c: &[char]| login(c).is_ok(),
/// );
/// ```
#[derive(Debug, Clone)]
pub struct WithValidator<O, V> {
    oracle: O,
    validator: V,
}

impl<O, V> WithValidator<O, V> {
    /// Attach `validator` to `oracle`.
    pub fn new(oracle: O, validator: V) -> Self {
        Self { oracle, validator }
    }

    /// The wrapped oracle.
    pub fn inner(&self) -> &O {
        &self.oracle
    }
}

impl<S, O, V> Oracle<S> for WithValidator<O, V>
where
    O: Oracle<S>,
    V: Fn(&[S]) -> bool,
{
    type Output = O::Output;

    #[inline]
    fn probe(&self, candidate: &[S]) -> Self::Output {
        self.oracle.probe(candidate)
    }

    fn validate(&self, candidate: &[S]) -> Option<bool> {
        Some((self.validator)(candidate))
    }
}
