//! Failure kinds and their HTTP status codes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Well-known failure categories produced by the pipeline and its steps.
///
/// Each kind fixes an HTTP status and a symbolic name that ends up in the
/// `name` field of the error body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Malformed input rejected before any step runs.
    Validation,
    /// Business-rule rejection.
    BadRequest,
    /// Missing or invalid credential.
    Unauthorized,
    /// Authenticated but not allowed.
    Forbidden,
    /// Referenced entity is absent.
    NotFound,
    /// Orchestrator-level deadline exceeded.
    Timeout,
    /// Unclassified failure.
    Internal,
    /// Uncaught fault raised by a step.
    Pipeline,
}

impl FailureKind {
    /// Returns the HTTP status code for this kind.
    #[must_use]
    pub const fn status(self) -> u16 {
        match self {
            Self::Validation | Self::BadRequest => 400,
            Self::Unauthorized => 401,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::Timeout => 408,
            Self::Internal | Self::Pipeline => 500,
        }
    }

    /// Returns the symbolic name reported to clients.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Validation => "ValidationError",
            Self::BadRequest => "BadRequest",
            Self::Unauthorized => "Unauthorized",
            Self::Forbidden => "Forbidden",
            Self::NotFound => "NotFound",
            Self::Timeout => "Timeout",
            Self::Internal => "InternalError",
            Self::Pipeline => "PipelineError",
        }
    }

    /// Maps a status code to the kind clients would expect for it.
    ///
    /// Used when a failure carries no explicit name. 400 maps to
    /// `BadRequest`, and unknown 5xx codes map to `Internal`.
    #[must_use]
    pub const fn for_status(status: u16) -> Option<Self> {
        match status {
            400 => Some(Self::BadRequest),
            401 => Some(Self::Unauthorized),
            403 => Some(Self::Forbidden),
            404 => Some(Self::NotFound),
            408 => Some(Self::Timeout),
            500..=599 => Some(Self::Internal),
            _ => None,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returns the name used for a failure that did not set one explicitly.
#[must_use]
pub fn fallback_name(status: u16) -> &'static str {
    FailureKind::for_status(status).map_or("Error", FailureKind::name)
}
