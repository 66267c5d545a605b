//! Pipeline lifecycle events.
//!
//! Every run reports its progress to an [`EventSink`]. The sink is
//! configured per pipeline; a [`LoggingEventSink`] is used when logging is
//! enabled and no other sink was given.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

use serde::{Deserialize, Serialize};
use std::fmt;

/// The lifecycle events a run emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// Validation passed and the first step is about to run.
    #[serde(rename = "pipeline.started")]
    PipelineStarted,
    /// A step is about to run.
    #[serde(rename = "step.started")]
    StepStarted,
    /// A step returned an `Ok` outcome.
    #[serde(rename = "step.completed")]
    StepCompleted,
    /// A step returned an `Err` outcome, raised an error or panicked.
    #[serde(rename = "step.failed")]
    StepFailed,
    /// A step set an explicit status and the response went out early.
    #[serde(rename = "pipeline.short_circuited")]
    PipelineShortCircuited,
    /// The run's deadline expired before a response was written.
    #[serde(rename = "pipeline.timeout")]
    PipelineTimeout,
    /// The run produced its response.
    #[serde(rename = "pipeline.completed")]
    PipelineCompleted,
}

impl EventKind {
    /// Returns the dotted event name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PipelineStarted => "pipeline.started",
            Self::StepStarted => "step.started",
            Self::StepCompleted => "step.completed",
            Self::StepFailed => "step.failed",
            Self::PipelineShortCircuited => "pipeline.short_circuited",
            Self::PipelineTimeout => "pipeline.timeout",
            Self::PipelineCompleted => "pipeline.completed",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
