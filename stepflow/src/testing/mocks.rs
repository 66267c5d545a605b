//! Mock steps for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::context::RequestContext;
use crate::core::{Failure, Outcome};
use crate::steps::Step;

/// What a [`MockStep`] saw on one call.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// Data passed in by the previous step.
    pub data: Value,
    /// Body facet at call time.
    pub body: Value,
    /// Query facet at call time.
    pub query: Value,
    /// Params facet at call time.
    pub params: Value,
    /// Cookies facet at call time.
    pub cookies: Value,
    /// Metadata values merged so far.
    pub metadata: serde_json::Map<String, Value>,
}

/// A step that records its calls and returns a configurable outcome.
///
/// By default it passes its input data through.
#[derive(Debug)]
pub struct MockStep {
    name: String,
    outcome: Mutex<Option<Outcome>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockStep {
    /// Creates a pass-through mock step.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            outcome: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Creates a mock step returning `outcome` on every call.
    #[must_use]
    pub fn returning(name: impl Into<String>, outcome: Outcome) -> Self {
        let step = Self::new(name);
        step.set_outcome(outcome);
        step
    }

    /// Sets the outcome to return.
    pub fn set_outcome(&self, outcome: Outcome) {
        *self.outcome.lock() = Some(outcome);
    }

    /// Number of calls so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Returns true when the step ran at least once.
    #[must_use]
    pub fn was_called(&self) -> bool {
        self.call_count() > 0
    }

    /// Every recorded call.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// The most recent call.
    #[must_use]
    pub fn last_call(&self) -> Option<RecordedCall> {
        self.calls.lock().last().cloned()
    }

    /// Clears recorded calls.
    pub fn reset(&self) {
        self.calls.lock().clear();
    }
}

#[async_trait]
impl Step for MockStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, data: Value, ctx: &RequestContext) -> anyhow::Result<Outcome> {
        self.calls.lock().push(RecordedCall {
            data: data.clone(),
            body: ctx.body().clone(),
            query: ctx.query().clone(),
            params: ctx.params().clone(),
            cookies: ctx.cookies().clone(),
            metadata: ctx.metadata().values().clone(),
        });
        let configured = self.outcome.lock().clone();
        Ok(configured.unwrap_or_else(|| Outcome::ok(data)))
    }
}

/// How a [`FailingStep`] fails.
#[derive(Debug, Clone)]
enum FailureMode {
    Returned(Failure),
    Raised(String),
}

/// A step that always fails.
#[derive(Debug)]
pub struct FailingStep {
    name: String,
    mode: FailureMode,
}

impl FailingStep {
    /// Returns `Err(message, status)`.
    #[must_use]
    pub fn new(name: impl Into<String>, message: impl Into<String>, status: u16) -> Self {
        Self {
            name: name.into(),
            mode: FailureMode::Returned(Failure::new(message, status)),
        }
    }

    /// Returns the given failure.
    #[must_use]
    pub fn with_failure(name: impl Into<String>, failure: Failure) -> Self {
        Self {
            name: name.into(),
            mode: FailureMode::Returned(failure),
        }
    }

    /// Raises an error instead of returning an outcome.
    #[must_use]
    pub fn raising(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mode: FailureMode::Raised(message.into()),
        }
    }
}

#[async_trait]
impl Step for FailingStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, _data: Value, _ctx: &RequestContext) -> anyhow::Result<Outcome> {
        match &self.mode {
            FailureMode::Returned(failure) => Ok(Outcome::Err(failure.clone())),
            FailureMode::Raised(message) => Err(anyhow::anyhow!(message.clone())),
        }
    }
}

/// A step that panics.
#[derive(Debug)]
pub struct PanickingStep {
    name: String,
    message: String,
}

impl PanickingStep {
    /// Creates a panicking step.
    #[must_use]
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl Step for PanickingStep {
    fn name(&self) -> &str {
        &self.name
    }

    #[allow(clippy::panic)]
    async fn run(&self, _data: Value, _ctx: &RequestContext) -> anyhow::Result<Outcome> {
        panic!("{}", self.message);
    }
}

/// A step that sleeps before passing its data through.
#[derive(Debug)]
pub struct SlowStep {
    name: String,
    delay: Duration,
    completed: Arc<AtomicBool>,
}

impl SlowStep {
    /// Creates a slow step.
    #[must_use]
    pub fn new(name: impl Into<String>, delay: Duration) -> Self {
        Self {
            name: name.into(),
            delay,
            completed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag set once the sleep finished, shared so tests can keep it after
    /// handing the step to a pipeline.
    #[must_use]
    pub fn completed_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.completed)
    }
}

#[async_trait]
impl Step for SlowStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, data: Value, _ctx: &RequestContext) -> anyhow::Result<Outcome> {
        tokio::time::sleep(self.delay).await;
        self.completed.store(true, Ordering::SeqCst);
        Ok(Outcome::ok(data))
    }
}

/// A step that appends its name to a shared log, to check ordering.
#[derive(Debug)]
pub struct RecordingStep {
    name: String,
    log: Arc<Mutex<Vec<String>>>,
    calls: AtomicUsize,
}

impl RecordingStep {
    /// Creates a step writing to `log`.
    #[must_use]
    pub fn new(name: impl Into<String>, log: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            name: name.into(),
            log,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of calls so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Step for RecordingStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, data: Value, _ctx: &RequestContext) -> anyhow::Result<Outcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.log.lock().push(self.name.clone());
        Ok(Outcome::ok(data))
    }
}
