//! Sequential pipeline execution.

use super::PipelineBuilder;
use crate::config::PipelineOptions;
use crate::context::{Request, RequestContext};
use crate::core::{Failure, Metadata, Outcome, Success};
use crate::dispatch::{Dispatcher, Response, ResponseChannel, TemplateRenderer};
use crate::events::{EventKind, EventSink};
use crate::observability::StepTimer;
use crate::steps::Step;
use crate::utils::generate_request_id;
use crate::validation::{validate_request, ValidationSchemas};
use futures::FutureExt;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, debug_span, error, info, info_span, warn, Instrument};
use uuid::Uuid;

pub(crate) struct PipelineInner {
    pub(crate) name: String,
    pub(crate) steps: Vec<Arc<dyn Step>>,
    pub(crate) schemas: ValidationSchemas,
    pub(crate) dispatcher: Dispatcher,
    pub(crate) sink: Arc<dyn EventSink>,
    pub(crate) renderer: Option<Arc<dyn TemplateRenderer>>,
}

/// An ordered list of steps run against one request at a time.
///
/// Cloning is cheap; every clone shares the same steps and options, and
/// each call to [`Pipeline::execute`] is an independent run.
#[derive(Clone)]
pub struct Pipeline {
    pub(crate) inner: Arc<PipelineInner>,
}

/// What a run produced.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// The single response of the run.
    pub response: Response,
    /// The run's request id.
    pub request_id: Uuid,
    /// Names of the steps that were started, in order.
    pub executed_steps: Vec<String>,
    /// True when the deadline produced the response.
    pub timed_out: bool,
    /// Wall time of the run.
    pub duration_ms: u64,
}

impl Pipeline {
    /// Starts building a pipeline.
    pub fn builder(name: impl Into<String>) -> PipelineBuilder {
        PipelineBuilder::new(name)
    }

    /// The pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Step names in execution order.
    #[must_use]
    pub fn step_names(&self) -> Vec<&str> {
        self.inner.steps.iter().map(|step| step.name()).collect()
    }

    /// The options in effect.
    #[must_use]
    pub fn options(&self) -> &PipelineOptions {
        self.inner.dispatcher.options()
    }

    /// The renderer for view responses, if one was configured.
    #[must_use]
    pub fn renderer(&self) -> Option<&Arc<dyn TemplateRenderer>> {
        self.inner.renderer.as_ref()
    }

    /// Formats a failure raised outside a run, e.g. by the HTTP edge, the
    /// same way the pipeline formats its own.
    pub fn failure_response(&self, failure: Failure) -> Response {
        self.inner.dispatcher.to_response(&Outcome::Err(failure))
    }

    /// Runs the pipeline and returns only the response.
    pub async fn handle(&self, request: Request) -> Response {
        self.execute(request).await.response
    }

    /// Runs the pipeline against `request`.
    ///
    /// Validation runs first; a failure is dispatched before any step
    /// starts. Steps then run in order until one fails, one sets an
    /// explicit status, the response channel is written, or the steps are
    /// exhausted. With a timeout configured the run races a timer, and
    /// whichever writes the channel first decides the response.
    pub async fn execute(&self, request: Request) -> ExecutionResult {
        let request_id = generate_request_id();
        let span = info_span!(
            "pipeline",
            pipeline = %self.inner.name,
            %request_id,
            method = %request.method,
            path = %request.path,
        );
        self.run(request, request_id).instrument(span).await
    }

    async fn run(&self, request: Request, request_id: Uuid) -> ExecutionResult {
        let inner = &self.inner;
        let options = inner.dispatcher.options();
        let timer = StepTimer::start(&inner.name);
        let channel = ResponseChannel::new();
        let executed = Arc::new(Mutex::new(Vec::new()));
        let mut timed_out = false;

        if options.enable_logging {
            info!(
                steps = inner.steps.len(),
                "Starting pipeline for {} {}", request.method, request.path
            );
        }

        match validate_request(&inner.schemas, request, channel.clone(), request_id) {
            Err(failure) => {
                if options.enable_logging {
                    warn!(error = %failure.message, "Request validation failed");
                }
                inner.dispatcher.dispatch(&Outcome::Err(failure), &channel);
            }
            Ok(ctx) => {
                inner
                    .sink
                    .emit(
                        EventKind::PipelineStarted,
                        json!({
                            "pipeline": inner.name,
                            "request_id": request_id,
                            "steps": inner.steps.len(),
                        }),
                    )
                    .await;

                let run = StepRun {
                    inner: Arc::clone(inner),
                    ctx,
                    executed: Arc::clone(&executed),
                };

                match options.timeout() {
                    None => run.drive().await,
                    Some(limit) => {
                        let handle = tokio::spawn(run.drive().in_current_span());
                        tokio::select! {
                            joined = handle => {
                                if let Err(err) = joined {
                                    error!(error = %err, "Pipeline task failed");
                                    let failure = Failure::internal(err.to_string());
                                    inner.dispatcher.dispatch(&Outcome::Err(failure), &channel);
                                }
                            }
                            () = tokio::time::sleep(limit) => {
                                timed_out = inner.dispatcher.dispatch(&Outcome::timeout(), &channel);
                                if timed_out {
                                    let timeout_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX);
                                    warn!(timeout_ms, "Pipeline timed out");
                                    inner
                                        .sink
                                        .emit(
                                            EventKind::PipelineTimeout,
                                            json!({
                                                "pipeline": inner.name,
                                                "request_id": request_id,
                                                "timeout_ms": timeout_ms,
                                            }),
                                        )
                                        .await;
                                }
                            }
                        }
                    }
                }
            }
        }

        let response = channel.take().unwrap_or_else(|| {
            error!("Pipeline finished without a response");
            inner
                .dispatcher
                .to_response(&Outcome::internal_error("Pipeline produced no response"))
        });
        let duration_ms = timer.elapsed_ms();

        inner
            .sink
            .emit(
                EventKind::PipelineCompleted,
                json!({
                    "pipeline": inner.name,
                    "request_id": request_id,
                    "status": response.status,
                    "duration_ms": duration_ms,
                    "timed_out": timed_out,
                }),
            )
            .await;
        if options.enable_logging {
            info!(
                status = response.status,
                duration_ms,
                success = response.status < 400,
                "Pipeline completed in {duration_ms}ms"
            );
        }

        let executed_steps = executed.lock().clone();
        ExecutionResult {
            response,
            request_id,
            executed_steps,
            timed_out,
            duration_ms,
        }
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.inner.name)
            .field("steps", &self.inner.steps)
            .field("schemas", &self.inner.schemas)
            .field("options", self.inner.dispatcher.options())
            .finish_non_exhaustive()
    }
}

/// The step loop of one run. Owns everything it touches so it can be
/// detached when the run races a timer.
struct StepRun {
    inner: Arc<PipelineInner>,
    ctx: RequestContext,
    executed: Arc<Mutex<Vec<String>>>,
}

impl StepRun {
    async fn drive(self) {
        let Self {
            inner,
            mut ctx,
            executed,
        } = self;
        let logging = inner.dispatcher.options().enable_logging;
        let request_id = ctx.request_id();
        let mut data = Value::Null;
        let mut failure = None;

        for step in &inner.steps {
            let name = step.name();
            if ctx.response().is_written() {
                debug!(step = name, "Response already sent, stopping");
                return;
            }

            executed.lock().push(name.to_string());
            inner
                .sink
                .emit(
                    EventKind::StepStarted,
                    json!({"pipeline": inner.name, "request_id": request_id, "step": name}),
                )
                .await;

            let timer = StepTimer::start(name);
            let outcome = match AssertUnwindSafe(step.run(std::mem::take(&mut data), &ctx))
                .catch_unwind()
                .instrument(debug_span!("step", step = name))
                .await
            {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(err)) => Outcome::from_error(&err, None),
                Err(panic) => Outcome::Err(Failure::from_panic(name, panic.as_ref())),
            };
            let duration_ms = timer.elapsed_ms();

            match outcome {
                Outcome::Err(err) => {
                    inner
                        .sink
                        .emit(
                            EventKind::StepFailed,
                            json!({
                                "pipeline": inner.name,
                                "request_id": request_id,
                                "step": name,
                                "status": err.status,
                                "error": err.message,
                                "duration_ms": duration_ms,
                            }),
                        )
                        .await;
                    if logging {
                        error!(step = name, status = err.status, "Pipeline stopped at {name} due to error");
                    }
                    failure = Some(err);
                    break;
                }
                Outcome::Ok(Success {
                    data: next,
                    metadata,
                    status,
                }) => {
                    let dropped = ctx.absorb(metadata);
                    if !dropped.is_empty() {
                        warn!(step = name, keys = ?dropped, "Ignoring metadata that names a request facet");
                    }
                    data = next;

                    inner
                        .sink
                        .emit(
                            EventKind::StepCompleted,
                            json!({
                                "pipeline": inner.name,
                                "request_id": request_id,
                                "step": name,
                                "duration_ms": duration_ms,
                            }),
                        )
                        .await;
                    if logging {
                        info!(step = name, duration_ms, "Completed {name}");
                    }

                    if let Some(status) = status {
                        inner
                            .sink
                            .emit(
                                EventKind::PipelineShortCircuited,
                                json!({
                                    "pipeline": inner.name,
                                    "request_id": request_id,
                                    "step": name,
                                    "status": status,
                                }),
                            )
                            .await;
                        let terminal = success(data, ctx.metadata().clone(), Some(status));
                        inner.dispatcher.dispatch(&terminal, ctx.response());
                        return;
                    }
                }
            }
        }

        let terminal = match failure {
            Some(failure) => Outcome::Err(failure),
            None => success(data, ctx.metadata().clone(), None),
        };
        inner.dispatcher.dispatch(&terminal, ctx.response());
    }
}

fn success(data: Value, metadata: Metadata, status: Option<u16>) -> Outcome {
    Outcome::Ok(Success {
        data,
        metadata,
        status,
    })
}
