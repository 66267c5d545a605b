//! Timestamp helpers.

use chrono::{DateTime, SecondsFormat, Utc};

/// Represents a timestamp that can be serialized/deserialized.
pub type Timestamp = DateTime<Utc>;

/// Returns the current UTC time as an ISO 8601 string with millisecond
/// precision, e.g. `2026-10-19T08:15:30.123Z`.
///
/// # Examples
///
/// ```
/// use stepflow::utils::iso_timestamp;
///
/// let ts = iso_timestamp();
/// assert!(ts.contains('T'));
/// assert!(ts.ends_with('Z'));
/// ```
#[must_use]
pub fn iso_timestamp() -> String {
    format_timestamp(&Utc::now())
}

/// Formats a timestamp the way [`iso_timestamp`] does.
#[must_use]
pub fn format_timestamp(ts: &Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Formats a timestamp for the `Expires` cookie attribute.
#[must_use]
pub fn http_date(ts: &Timestamp) -> String {
    ts.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
