//! Pipeline step contract and built-in step adapters.

mod middleware;

pub use middleware::{wrap_middleware, MiddlewareStep};

use crate::context::RequestContext;
use crate::core::Outcome;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;
use std::future::Future;

/// A unit of work in a pipeline.
///
/// A step receives the previous step's data and the run's context and
/// produces the next [`Outcome`]. Returning `Err` from the `anyhow::Result`
/// is a raised fault: the orchestrator converts it with
/// [`Failure::from_error`](crate::core::Failure::from_error) and stops the
/// run. A panic inside the step is caught and treated the same way.
#[async_trait]
pub trait Step: Send + Sync + Debug {
    /// Returns the name of the step, used in logs and events.
    fn name(&self) -> &str;

    /// Runs the step.
    ///
    /// # Arguments
    ///
    /// * `data` - The data produced by the previous step (`null` for the first)
    /// * `ctx` - The validated request plus metadata merged so far
    async fn run(&self, data: Value, ctx: &RequestContext) -> anyhow::Result<Outcome>;
}

/// A step built from a synchronous function.
pub struct FnStep<F>
where
    F: Fn(Value, &RequestContext) -> anyhow::Result<Outcome> + Send + Sync,
{
    name: String,
    func: F,
}

impl<F> FnStep<F>
where
    F: Fn(Value, &RequestContext) -> anyhow::Result<Outcome> + Send + Sync,
{
    /// Creates a new function-based step.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Debug for FnStep<F>
where
    F: Fn(Value, &RequestContext) -> anyhow::Result<Outcome> + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStep").field("name", &self.name).finish()
    }
}

#[async_trait]
impl<F> Step for FnStep<F>
where
    F: Fn(Value, &RequestContext) -> anyhow::Result<Outcome> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, data: Value, ctx: &RequestContext) -> anyhow::Result<Outcome> {
        (self.func)(data, ctx)
    }
}

/// A step built from an async function.
///
/// The function receives its own clone of the context so the returned
/// future can own it.
pub struct AsyncFnStep<F, Fut>
where
    F: Fn(Value, RequestContext) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Outcome>> + Send,
{
    name: String,
    func: F,
}

impl<F, Fut> AsyncFnStep<F, Fut>
where
    F: Fn(Value, RequestContext) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Outcome>> + Send,
{
    /// Creates a new async function-based step.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F, Fut> Debug for AsyncFnStep<F, Fut>
where
    F: Fn(Value, RequestContext) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Outcome>> + Send,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncFnStep").field("name", &self.name).finish()
    }
}

#[async_trait]
impl<F, Fut> Step for AsyncFnStep<F, Fut>
where
    F: Fn(Value, RequestContext) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Outcome>> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, data: Value, ctx: &RequestContext) -> anyhow::Result<Outcome> {
        (self.func)(data, ctx.clone()).await
    }
}

/// Creates an [`AsyncFnStep`].
pub fn step_fn<F, Fut>(name: impl Into<String>, func: F) -> AsyncFnStep<F, Fut>
where
    F: Fn(Value, RequestContext) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Outcome>> + Send,
{
    AsyncFnStep::new(name, func)
}

/// A step that passes its input through unchanged.
#[derive(Debug, Clone)]
pub struct NoOpStep {
    name: String,
}

impl NoOpStep {
    /// Creates a new no-op step.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Step for NoOpStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, data: Value, _ctx: &RequestContext) -> anyhow::Result<Outcome> {
        Ok(Outcome::ok(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::test_context;
    use serde_json::json;

    #[tokio::test]
    async fn test_fn_step() {
        let step = FnStep::new("double", |data: Value, _ctx: &RequestContext| {
            let n = data.as_i64().unwrap_or_default();
            Ok(Outcome::ok(json!(n * 2)))
        });

        assert_eq!(step.name(), "double");
        let outcome = step.run(json!(21), &test_context()).await.unwrap();
        assert_eq!(outcome.data(), Some(&json!(42)));
    }

    #[tokio::test]
    async fn test_async_fn_step_sees_context() {
        let step = step_fn("echo-path", |_data, ctx: RequestContext| async move {
            Ok(Outcome::ok(json!(ctx.path())))
        });

        let outcome = step.run(Value::Null, &test_context()).await.unwrap();
        assert_eq!(outcome.data(), Some(&json!("/test")));
    }

    #[tokio::test]
    async fn test_async_fn_step_propagates_error() {
        let step = step_fn("fails", |_data, _ctx| async move {
            Err::<Outcome, _>(anyhow::anyhow!("database unavailable"))
        });

        let err = step.run(Value::Null, &test_context()).await.unwrap_err();
        assert_eq!(err.to_string(), "database unavailable");
    }

    #[tokio::test]
    async fn test_noop_step() {
        let step = NoOpStep::new("noop");
        let outcome = step.run(json!({"a": 1}), &test_context()).await.unwrap();
        assert_eq!(outcome.data(), Some(&json!({"a": 1})));
        assert!(format!("{step:?}").contains("noop"));
    }
}
