//! # Stepflow
//!
//! Sequential request pipelines with a typed outcome algebra.
//!
//! A [`Pipeline`](pipeline::Pipeline) validates an incoming request, runs an
//! ordered list of steps against it, and writes exactly one response:
//!
//! - **Outcomes**: every step returns [`Outcome`](core::Outcome), either a
//!   success with data, metadata and an optional status, or a failure with a
//!   status and a symbolic name
//! - **Validation**: per-facet schemas for body, query, params and cookies
//!   run before the first step
//! - **Short-circuiting**: a failure, an explicit status or a response
//!   written by a middleware ends the run
//! - **Single dispatch**: a timeout races the run and whichever writes first
//!   is the response
//! - **HTTP edge**: pipelines mount directly on axum routes
//!
//! ## Quick Start
//!
//! ```rust
//! use serde_json::json;
//! use stepflow::prelude::*;
//!
//! # tokio_test::block_on(async {
//! let pipeline = Pipeline::builder("create-task")
//!     .body_schema(ObjectSchema::new().field("title", FieldRule::string().min_len(1)))
//!     .step_fn("create", |_data, ctx| async move {
//!         Ok(Outcome::ok_with_status(json!({"title": ctx.body()["title"]}), 201))
//!     })
//!     .build()
//!     .unwrap();
//!
//! let response = pipeline
//!     .handle(Request::post("/tasks").with_body(json!({"title": "Write docs"})))
//!     .await;
//! assert_eq!(response.status, 201);
//! # });
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

#[cfg(feature = "auth")]
pub mod auth;
pub mod config;
pub mod context;
pub mod core;
pub mod dispatch;
pub mod errors;
pub mod events;
#[cfg(feature = "http")]
pub mod http;
pub mod observability;
pub mod pipeline;
pub mod steps;
pub mod testing;
pub mod utils;
pub mod validation;

/// Prelude module for convenient imports
pub mod prelude {
    #[cfg(feature = "auth")]
    pub use crate::auth::{authenticate, AuthMode, Claims, TokenConfig, TokenService};
    pub use crate::config::{ExecutionMode, PipelineOptions};
    pub use crate::context::{Request, RequestContext};
    pub use crate::core::{
        CookieOptions, Failure, FailureKind, Metadata, Outcome, SameSite, Success,
    };
    pub use crate::dispatch::{JsonTemplateRenderer, Response, ResponseBody, TemplateRenderer};
    pub use crate::errors::{RenderError, StepflowError};
    pub use crate::events::{CollectingEventSink, EventKind, EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::observability::{init_tracing, LogFormat};
    pub use crate::pipeline::{ExecutionResult, Pipeline, PipelineBuilder};
    pub use crate::steps::{step_fn, wrap_middleware, FnStep, NoOpStep, Step};
    pub use crate::utils::iso_timestamp;
    pub use crate::validation::{
        FieldRule, ObjectSchema, Schema, SerdeSchema, ValidationError, ValidationSchemas,
    };
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn library_compiles() {
        let pipeline = Pipeline::builder("smoke").build();
        assert!(pipeline.is_ok());
    }
}
