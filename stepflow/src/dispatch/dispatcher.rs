//! Maps a terminal outcome onto the single response of a run.

use super::{Response, ResponseBody, ResponseChannel, SetCookie};
use crate::config::PipelineOptions;
use crate::core::{Directive, Failure, Outcome, Success};
use crate::utils::iso_timestamp;
use serde_json::{json, Value};
use tracing::{debug, error, info};

/// Response dispatcher for one pipeline.
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    options: PipelineOptions,
}

impl Dispatcher {
    /// Creates a dispatcher.
    #[must_use]
    pub const fn new(options: PipelineOptions) -> Self {
        Self { options }
    }

    /// The options in effect.
    #[must_use]
    pub const fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Writes the response for `outcome`, unless the channel was already
    /// written. Returns true when this call produced the response.
    pub fn dispatch(&self, outcome: &Outcome, channel: &ResponseChannel) -> bool {
        if channel.is_written() {
            debug!("Response already sent, skipping dispatch");
            return false;
        }

        let response = self.to_response(outcome);
        if self.options.enable_logging {
            match outcome {
                Outcome::Ok(_) => info!(status = response.status, "Success response"),
                Outcome::Err(failure) => error!(
                    status = response.status,
                    message = %failure.message,
                    name = failure.display_name(),
                    "Error response"
                ),
            }
        }
        channel.write(response)
    }

    /// Builds the response for `outcome` without writing it.
    #[must_use]
    pub fn to_response(&self, outcome: &Outcome) -> Response {
        match outcome {
            Outcome::Ok(success) => self.success_response(success),
            Outcome::Err(failure) => self.failure_response(failure),
        }
    }

    fn success_response(&self, success: &Success<Value>) -> Response {
        let status = self.options.resolve_success_status(success.status);
        let data = &success.data;

        let mut response = if let Some(template) = data.get("view").and_then(Value::as_str) {
            let view_data = data.get("data").cloned().unwrap_or_else(|| json!({}));
            Response::view(status, template, view_data)
        } else if let Some(location) = data.get("redirect").and_then(Value::as_str) {
            let status = success
                .status
                .or(self.options.success_status)
                .filter(|status| (300..=399).contains(status))
                .unwrap_or(302);
            Response::redirect(status, location)
        } else {
            Response::json(status, data.clone())
        };

        let directives = success.metadata.directives();
        for directive in directives {
            if let Directive::Header { name, value } = directive {
                response.headers.push((name.clone(), value.clone()));
            }
        }
        for directive in directives {
            if let Directive::Cookie {
                name,
                value,
                options,
            } = directive
            {
                response
                    .cookies
                    .push(SetCookie::new(name.clone(), value.clone(), options.clone()));
            }
        }
        response
    }

    fn failure_response(&self, failure: &Failure) -> Response {
        let mut body = json!({
            "error": failure.message,
            "name": failure.display_name(),
            "timestamp": iso_timestamp(),
        });
        if self.options.expose_stack() {
            if let (Some(stack), Some(fields)) = (&failure.stack, body.as_object_mut()) {
                fields.insert("stack".into(), Value::String(stack.clone()));
            }
        }
        Response::new(failure.status, ResponseBody::Json(body))
    }
}
