//! Pipeline building and execution.
//!
//! This module provides:
//! - [`PipelineBuilder`] for assembling steps, schemas and options
//! - [`Pipeline`], the orchestrator that runs one request at a time
//! - [`ExecutionResult`], the response plus what the run did

mod builder;
mod compose;

pub use builder::PipelineBuilder;
pub use compose::{ExecutionResult, Pipeline};

pub(crate) use compose::PipelineInner;
