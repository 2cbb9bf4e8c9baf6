//! JSON serialization for reconstruction reports.

use serde::Serialize;

use crate::result::AttackReport;

/// Serialize an [`AttackReport`] to a compact JSON string.
///
/// # Errors
///
/// Returns an error only if a symbol type's own `Serialize` impl fails.
pub fn to_json<S: Serialize>(report: &AttackReport<S>) -> Result<String, serde_json::Error> {
    serde_json::to_string(report)
}

/// Serialize an [`AttackReport`] to a pretty-printed JSON string.
///
/// # Errors
///
/// Returns an error only if a symbol type's own `Serialize` impl fails.
pub fn to_json_pretty<S: Serialize>(report: &AttackReport<S>) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}
