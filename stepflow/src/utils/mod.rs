//! Utility functions for request ids and timestamps.

pub mod timestamps;

pub use timestamps::{format_timestamp, http_date, iso_timestamp, Timestamp};

use uuid::Uuid;

/// Generates a random request id.
#[must_use]
pub fn generate_request_id() -> Uuid {
    Uuid::new_v4()
}
