//! Decision layer.
//!
//! 1. **Distinguisher** ([`distinguisher`]): picks the dominant candidate of a
//!    round, or declares the round ambiguous
//! 2. **Consensus** ([`consensus`]): agreement across independent
//!    reconstructions of the same secret

mod consensus;
mod distinguisher;

pub use consensus::{consensus, Consensus};
pub use distinguisher::{Distinguisher, Selection};
