//! Request context for pipeline runs.
//!
//! This module provides:
//! - A framework-neutral [`Request`] built by the HTTP edge or by tests
//! - The immutable [`RequestInput`] produced by validation
//! - The per-run [`RequestContext`] steps read from

mod cookies;
mod request;
mod request_context;

pub use cookies::{cookies_from_headers, parse_cookie_header};
pub use request::{Request, RequestInput};
pub use request_context::{RequestContext, FIXED_FIELDS};
