//! Statistical reductions for latency samples.
//!
//! - Quantiles via O(n) selection (R-7 definition)
//! - Per-candidate summaries under mean, trimmed-mean or median aggregation

mod quantile;
mod summary;

pub use quantile::{compute_quantile, median, median_abs_deviation};
pub use summary::{mean, std_dev, summarize, CandidateStatistic};
