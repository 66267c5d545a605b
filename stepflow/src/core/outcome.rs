//! The two-case outcome every step and the orchestrator communicate through.

use super::{fallback_name, FailureKind, Metadata};
use crate::errors::StepflowError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::fmt;

/// Successful step result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Success<T> {
    /// The step's data. Replaces the running data of the pipeline.
    pub data: T,
    /// Side-channel metadata merged into the running context.
    #[serde(default)]
    pub metadata: Metadata,
    /// Explicit final status. Its presence requests an immediate dispatch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

/// Failed step result.
///
/// `Failure` is also a [`std::error::Error`], so step bodies can raise it
/// with `?` and the orchestrator recovers the status and name intact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    /// Human-readable message.
    pub message: String,
    /// HTTP status code.
    pub status: u16,
    /// Symbolic name, e.g. `NotFound`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Diagnostic trace, only exposed outside production.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl Failure {
    /// Creates a failure with a message and status.
    #[must_use]
    pub fn new(message: impl Into<String>, status: u16) -> Self {
        Self {
            message: message.into(),
            status,
            name: None,
            stack: None,
        }
    }

    /// Creates a failure of a well-known kind.
    #[must_use]
    pub fn of_kind(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::new(message, kind.status()).with_name(kind.name())
    }

    /// Creates a 500 failure.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::of_kind(FailureKind::Internal, message)
    }

    /// Sets the symbolic name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the diagnostic trace.
    #[must_use]
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Returns the explicit name, or the canonical one for the status.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| fallback_name(self.status))
    }

    /// Converts a raised error into a failure.
    ///
    /// Status resolution: `status_override`, then a status carried by an
    /// error in the chain (`Failure` or [`StepflowError`]), then 500. The
    /// carried name is kept only while its status stands; an override that
    /// changes the status takes the name for the new status.
    /// The message is the outermost error's, the stack is the rendered
    /// error chain.
    #[must_use]
    pub fn from_error(error: &anyhow::Error, status_override: Option<u16>) -> Self {
        let carried = error.chain().find_map(|cause| {
            if let Some(failure) = cause.downcast_ref::<Self>() {
                return Some((failure.status, failure.display_name().to_string()));
            }
            cause
                .downcast_ref::<StepflowError>()
                .map(|err| (err.status_code(), err.name().to_string()))
        });

        let (status, name) = match (carried, status_override) {
            (Some((status, name)), None) => (status, name),
            (Some((status, name)), Some(code)) if code == status => (status, name),
            (_, Some(code)) => (code, fallback_name(code).to_string()),
            (None, None) => (500, "Error".to_string()),
        };

        Self {
            message: error.to_string(),
            status,
            name: Some(name),
            stack: Some(format!("{error:?}")),
        }
    }

    /// Converts a panic payload caught at a step boundary.
    #[must_use]
    pub fn from_panic(step: &str, payload: &(dyn Any + Send)) -> Self {
        let detail = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());

        Self::of_kind(FailureKind::Pipeline, detail)
            .with_stack(format!("Pipeline step: {step}"))
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Failure {}

/// Outcome of a step or of a whole pipeline run.
///
/// Exactly one variant is live; consumers match exhaustively.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub enum Outcome<T = Value> {
    /// Success with data, metadata and an optional final status.
    Ok(Success<T>),
    /// Failure with message, status, name and stack.
    Err(Failure),
}

impl<T> Outcome<T> {
    /// Success with empty metadata and no explicit status.
    pub fn ok(data: T) -> Self {
        Self::Ok(Success {
            data,
            metadata: Metadata::new(),
            status: None,
        })
    }

    /// Success with an explicit final status.
    pub fn ok_with_status(data: T, status: u16) -> Self {
        Self::Ok(Success {
            data,
            metadata: Metadata::new(),
            status: Some(status),
        })
    }

    /// Success carrying side-channel metadata.
    pub fn ok_with_metadata(data: T, metadata: Metadata) -> Self {
        Self::Ok(Success {
            data,
            metadata,
            status: None,
        })
    }

    /// Success carrying metadata and an explicit final status.
    pub fn ok_with(data: T, metadata: Metadata, status: u16) -> Self {
        Self::Ok(Success {
            data,
            metadata,
            status: Some(status),
        })
    }

    /// Failure with a message and status.
    pub fn err(message: impl Into<String>, status: u16) -> Self {
        Self::Err(Failure::new(message, status))
    }

    /// See [`Failure::from_error`].
    pub fn from_error(error: &anyhow::Error, status_override: Option<u16>) -> Self {
        Self::Err(Failure::from_error(error, status_override))
    }

    /// 400 `BadRequest`.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::Err(Failure::of_kind(FailureKind::BadRequest, message))
    }

    /// 401 `Unauthorized`.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Err(Failure::of_kind(FailureKind::Unauthorized, message))
    }

    /// 403 `Forbidden`.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Err(Failure::of_kind(FailureKind::Forbidden, message))
    }

    /// 404 `NotFound`.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::Err(Failure::of_kind(FailureKind::NotFound, message))
    }

    /// 500 `InternalError`.
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::Err(Failure::of_kind(FailureKind::Internal, message))
    }

    /// 400 `ValidationError`.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::Err(Failure::of_kind(FailureKind::Validation, message))
    }

    /// 408 `Timeout` with the standard message.
    pub fn timeout() -> Self {
        Self::Err(Failure::of_kind(FailureKind::Timeout, "Request timeout"))
    }

    /// Returns true for the success variant.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    /// Returns true for the failure variant.
    #[must_use]
    pub const fn is_err(&self) -> bool {
        matches!(self, Self::Err(_))
    }

    /// Explicit status of a success, or the status of a failure.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Ok(success) => success.status,
            Self::Err(failure) => Some(failure.status),
        }
    }

    /// Returns the success data, if any.
    #[must_use]
    pub const fn data(&self) -> Option<&T> {
        match self {
            Self::Ok(success) => Some(&success.data),
            Self::Err(_) => None,
        }
    }

    /// Returns the failure, if any.
    #[must_use]
    pub const fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Ok(_) => None,
            Self::Err(failure) => Some(failure),
        }
    }

    /// Maps the success data, keeping metadata and status.
    pub fn map<U, F>(self, f: F) -> Outcome<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Self::Ok(Success {
                data,
                metadata,
                status,
            }) => Outcome::Ok(Success {
                data: f(data),
                metadata,
                status,
            }),
            Self::Err(failure) => Outcome::Err(failure),
        }
    }

    /// Converts into a standard `Result`.
    ///
    /// # Errors
    ///
    /// Returns the failure for the `Err` variant.
    pub fn into_result(self) -> Result<Success<T>, Failure> {
        match self {
            Self::Ok(success) => Ok(success),
            Self::Err(failure) => Err(failure),
        }
    }
}

impl<T: Serialize> Outcome<T> {
    /// Serializes typed data into the JSON outcome the pipeline threads.
    ///
    /// A serialization failure becomes a 500 failure.
    pub fn into_json(self) -> Outcome<Value> {
        match self {
            Self::Ok(Success {
                data,
                metadata,
                status,
            }) => match serde_json::to_value(data) {
                Ok(data) => Outcome::Ok(Success {
                    data,
                    metadata,
                    status,
                }),
                Err(err) => Outcome::from_error(&StepflowError::from(err).into(), None),
            },
            Self::Err(failure) => Outcome::Err(failure),
        }
    }
}

impl<T> From<Failure> for Outcome<T> {
    fn from(failure: Failure) -> Self {
        Self::Err(failure)
    }
}
