//! Testing utilities for stepflow pipelines.
//!
//! This module provides:
//! - Mock steps that record calls, fail, panic or sleep
//! - Request and context fixtures
//! - Assertions for dispatched responses and outcomes

mod assertions;
pub mod fixtures;
mod mocks;

pub use assertions::{
    assert_cookie, assert_err, assert_error_body, assert_header, assert_json_body,
    assert_no_directives, assert_ok, assert_redirect, assert_status, assert_view,
};
pub use fixtures::{context_for, json_request, test_context, test_request};
pub use mocks::{FailingStep, MockStep, PanickingStep, RecordedCall, RecordingStep, SlowStep};
