//! KV key layout.
//!
//! Context labels are free text, so they are hex-encoded inside attendance
//! keys to keep `:` unambiguous and prefix scans exact.

use chrono::NaiveDate;

/// Build the KV key for a catalog record.
/// Format: `{prefix}:id:{identity_id}`
pub fn identity_key(prefix: &str, id: &str) -> String {
    format!("{prefix}:id:{id}")
}

/// Return the KV prefix for listing the whole catalog.
/// Format: `{prefix}:id:`
pub fn identity_prefix(prefix: &str) -> String {
    format!("{prefix}:id:")
}

/// Build the KV key for an attendance entry.
/// Format: `{prefix}:att:{YYYY-MM-DD}:{hex(context)}:{identity_id}`
pub fn attendance_key(prefix: &str, date: NaiveDate, context: &str, id: &str) -> String {
    format!("{}{id}", session_prefix(prefix, date, context))
}

/// Return the KV prefix for all entries of one date and context.
/// Format: `{prefix}:att:{YYYY-MM-DD}:{hex(context)}:`
pub fn session_prefix(prefix: &str, date: NaiveDate, context: &str) -> String {
    format!(
        "{prefix}:att:{}:{}:",
        date.format("%Y-%m-%d"),
        hex::encode(context)
    )
}
