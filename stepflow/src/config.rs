//! Pipeline configuration.

use crate::errors::StepflowError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Environment variable consulted by [`ExecutionMode::from_env`].
pub const MODE_ENV_VAR: &str = "APP_ENV";

/// Deployment mode. Controls whether failure stacks reach clients.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Local development; stacks are exposed.
    Development,
    /// Test runs; stacks are exposed.
    Test,
    /// Production; stacks are withheld.
    #[default]
    Production,
}

impl ExecutionMode {
    /// Reads the mode from `APP_ENV`, defaulting to production.
    #[must_use]
    pub fn from_env() -> Self {
        std::env::var(MODE_ENV_VAR)
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default()
    }

    /// Returns true for production.
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl FromStr for ExecutionMode {
    type Err = StepflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "test" => Ok(Self::Test),
            "production" | "prod" => Ok(Self::Production),
            other => Err(StepflowError::Config(format!("unknown execution mode '{other}'"))),
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Test => write!(f, "test"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// Options shared by the orchestrator and the dispatcher of one pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineOptions {
    /// Status used for successes that never set one. 200 when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_status: Option<u16>,
    /// Log pipeline progress and responses.
    #[serde(default)]
    pub enable_logging: bool,
    /// Deadline for the whole run, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// Deployment mode.
    #[serde(default)]
    pub mode: ExecutionMode,
}

impl PipelineOptions {
    /// Creates default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default success status.
    #[must_use]
    pub const fn with_success_status(mut self, status: u16) -> Self {
        self.success_status = Some(status);
        self
    }

    /// Enables or disables logging.
    #[must_use]
    pub const fn with_logging(mut self, enabled: bool) -> Self {
        self.enable_logging = enabled;
        self
    }

    /// Sets the run deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Sets the execution mode.
    #[must_use]
    pub const fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Returns the run deadline.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Resolves the status of a success: explicit, then default, then 200.
    #[must_use]
    pub fn resolve_success_status(&self, explicit: Option<u16>) -> u16 {
        explicit.or(self.success_status).unwrap_or(200)
    }

    /// Returns true when failure stacks may be sent to clients.
    #[must_use]
    pub const fn expose_stack(&self) -> bool {
        !self.mode.is_production()
    }

    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns an error for a success status outside 100..=599 or a zero
    /// timeout.
    pub fn validate(&self) -> Result<(), StepflowError> {
        if let Some(status) = self.success_status {
            if !(100..=599).contains(&status) {
                return Err(StepflowError::Config(format!(
                    "success status {status} is not a valid HTTP status"
                )));
            }
        }
        if self.timeout_ms == Some(0) {
            return Err(StepflowError::Config("timeout must be greater than zero".into()));
        }
        Ok(())
    }
}
