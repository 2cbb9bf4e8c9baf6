//! Human-readable and machine-readable reports.

mod json;
mod terminal;

pub use json::{to_json, to_json_pretty};
pub use terminal::{format_report, format_round_distribution};
