//! Core domain model types for stepflow.
//!
//! This module contains the result algebra used throughout the crate:
//! - `Outcome`, the closed success/failure type
//! - `Metadata` and the header/cookie directives it carries
//! - Failure kinds with their status codes

mod metadata;
mod outcome;
#[cfg(test)]
mod outcome_tests;
mod status;

pub use metadata::{CookieOptions, Directive, DirectiveKind, Metadata, SameSite};
pub use outcome::{Failure, Outcome, Success};
pub use status::{fallback_name, FailureKind};
