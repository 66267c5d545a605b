//! Writing a pipeline [`Response`] as an axum response.

use crate::core::{Failure, FailureKind};
use crate::dispatch::{Response, ResponseBody};
use crate::errors::RenderError;
use crate::pipeline::Pipeline;
use axum::response::{Html, IntoResponse};
use axum::Json;
use http::header::{HeaderName, HeaderValue, LOCATION, SET_COOKIE};
use http::StatusCode;
use serde_json::Value;
use tracing::{error, warn};

/// Converts `response`, rendering views with the pipeline's renderer.
///
/// A view that cannot be rendered, or a redirect whose location is not a
/// valid header value, becomes a 500 error body instead; its headers and
/// cookies are dropped with it.
pub(crate) fn into_http_response(
    pipeline: &Pipeline,
    response: Response,
) -> axum::response::Response {
    let Response {
        status,
        headers,
        cookies,
        body,
    } = response;
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let mut out = match body {
        ResponseBody::Json(value) => (status, Json(value)).into_response(),
        ResponseBody::Redirect(location) => match HeaderValue::from_str(&location) {
            Ok(value) => {
                let mut redirect = status.into_response();
                redirect.headers_mut().insert(LOCATION, value);
                redirect
            }
            Err(_) => {
                error!(%location, "Invalid redirect location");
                return failed(pipeline, Failure::internal("Invalid redirect location"));
            }
        },
        ResponseBody::View { template, data } => match render(pipeline, &template, &data) {
            Ok(html) => (status, Html(html)).into_response(),
            Err(err) => {
                error!(%template, error = %err, "View rendering failed");
                let failure =
                    Failure::of_kind(FailureKind::Internal, err.to_string()).with_name("RenderError");
                return failed(pipeline, failure);
            }
        },
    };

    for (name, value) in headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            (Ok(name), Ok(value)) => {
                out.headers_mut().insert(name, value);
            }
            _ => warn!(header = %name, "Skipping invalid response header"),
        }
    }

    for cookie in cookies {
        match HeaderValue::from_str(&cookie.to_header_value()) {
            Ok(value) => {
                out.headers_mut().append(SET_COOKIE, value);
            }
            Err(_) => warn!(cookie = %cookie.name, "Skipping invalid cookie"),
        }
    }

    out
}

fn render(pipeline: &Pipeline, template: &str, data: &Value) -> Result<String, RenderError> {
    pipeline
        .renderer()
        .ok_or_else(|| RenderError::new(template, "no template renderer configured"))?
        .render(template, data)
}

fn failed(pipeline: &Pipeline, failure: Failure) -> axum::response::Response {
    into_http_response(pipeline, pipeline.failure_response(failure))
}
