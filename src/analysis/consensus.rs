//! Agreement across repeated reconstructions.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::Symbol;

/// The most frequent reconstruction among several attempts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consensus<S> {
    /// The winning reconstruction.
    pub secret: Vec<S>,
    /// Attempts that produced it.
    pub votes: usize,
    /// Attempts made, completed or not.
    pub attempts: usize,
}

impl<S> Consensus<S> {
    /// Share of all attempts that agree with the consensus, in `[0, 1]`.
    pub fn agreement(&self) -> f64 {
        if self.attempts == 0 {
            return 0.0;
        }
        self.votes as f64 / self.attempts as f64
    }

    /// Whether more than half of the attempts agree.
    pub fn is_majority(&self) -> bool {
        self.votes * 2 > self.attempts
    }
}

/// Most frequent secret among `completed`, out of `attempts` total runs.
///
/// Ties go to the secret seen first. `None` when nothing completed.
pub fn consensus<S: Symbol>(completed: &[Vec<S>], attempts: usize) -> Option<Consensus<S>> {
    let mut votes: HashMap<&[S], (usize, usize)> = HashMap::new();
    for (first_seen, secret) in completed.iter().enumerate() {
        votes.entry(secret.as_slice()).or_insert((0, first_seen)).0 += 1;
    }

    votes
        .into_iter()
        .max_by(|(_, (va, fa)), (_, (vb, fb))| va.cmp(vb).then(fb.cmp(fa)))
        .map(|(secret, (votes, _))| Consensus {
            secret: secret.to_vec(),
            votes,
            attempts: attempts.max(completed.len()),
        })
}
