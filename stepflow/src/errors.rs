//! Error types for the stepflow crate.
//!
//! Library operations return [`StepflowError`]. Step bodies return
//! `anyhow::Result`, and the orchestrator maps anything they raise into a
//! [`Failure`](crate::core::Failure) using the status each error carries.

use crate::core::FailureKind;
use crate::validation::ValidationError;
use thiserror::Error;

/// The main error type for stepflow operations.
#[derive(Debug, Error)]
pub enum StepflowError {
    /// Request input failed schema validation.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// The request body could not be decoded.
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// A pipeline was configured inconsistently.
    #[error("Invalid pipeline configuration: {0}")]
    Config(String),

    /// A template could not be rendered.
    #[error("{0}")]
    Render(#[from] RenderError),

    /// A token could not be issued.
    #[error("Token error: {0}")]
    Token(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StepflowError {
    /// Returns the failure kind this error maps to.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Validation(_) => FailureKind::Validation,
            Self::InvalidBody(_) => FailureKind::BadRequest,
            Self::Config(_)
            | Self::Render(_)
            | Self::Token(_)
            | Self::Serialization(_)
            | Self::Internal(_) => FailureKind::Internal,
        }
    }

    /// Returns the HTTP status code this error maps to.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        self.kind().status()
    }

    /// Returns the symbolic name reported to clients.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.kind().name()
    }
}

/// Error raised by a template renderer.
#[derive(Debug, Clone, Error)]
#[error("Failed to render template '{template}': {message}")]
pub struct RenderError {
    /// The template name.
    pub template: String,
    /// What went wrong.
    pub message: String,
}

impl RenderError {
    /// Creates a new render error.
    #[must_use]
    pub fn new(template: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            message: message.into(),
        }
    }
}
