//! Test assertions for responses and outcomes.

use crate::core::Outcome;
use crate::dispatch::{Response, ResponseBody};
use serde_json::Value;

/// Asserts the response status.
pub fn assert_status(response: &Response, expected: u16) {
    assert_eq!(
        response.status, expected,
        "Expected status {expected}, got {} with body {:?}",
        response.status, response.body
    );
}

/// Asserts a JSON response with exactly `expected` as its body.
pub fn assert_json_body(response: &Response, expected: &Value) {
    match &response.body {
        ResponseBody::Json(actual) => assert_eq!(actual, expected, "JSON body mismatch"),
        other => panic!("Expected JSON body, got {other:?}"),
    }
}

/// Asserts the standard error body: status, `error`, `name`, an ISO
/// `timestamp` and no `stack`.
pub fn assert_error_body(response: &Response, status: u16, message: &str, name: &str) {
    assert_status(response, status);
    let Some(body) = response.json_body() else {
        panic!("Expected JSON error body, got {:?}", response.body);
    };
    assert_eq!(body["error"], message, "error message mismatch in {body}");
    assert_eq!(body["name"], name, "error name mismatch in {body}");
    assert!(
        body["timestamp"].as_str().is_some_and(|ts| ts.ends_with('Z')),
        "Expected ISO timestamp in {body}"
    );
    assert!(body.get("stack").is_none(), "Unexpected stack in {body}");
}

/// Asserts a header value.
pub fn assert_header(response: &Response, name: &str, expected: &str) {
    assert_eq!(
        response.header(name),
        Some(expected),
        "Header '{name}' mismatch; headers: {:?}",
        response.headers
    );
}

/// Asserts a cookie value.
pub fn assert_cookie(response: &Response, name: &str, expected: &str) {
    let cookie = response.cookie(name);
    assert_eq!(
        cookie.map(|c| c.value.as_str()),
        Some(expected),
        "Cookie '{name}' mismatch; cookies: {:?}",
        response.cookies
    );
}

/// Asserts that neither headers nor cookies were set.
pub fn assert_no_directives(response: &Response) {
    assert!(
        response.headers.is_empty() && response.cookies.is_empty(),
        "Expected no headers or cookies, got {:?} / {:?}",
        response.headers,
        response.cookies
    );
}

/// Asserts a redirect to `location`.
pub fn assert_redirect(response: &Response, location: &str) {
    assert_eq!(
        response.body,
        ResponseBody::Redirect(location.to_string()),
        "Expected redirect to {location}"
    );
}

/// Asserts a rendered view.
pub fn assert_view(response: &Response, template: &str, data: &Value) {
    match &response.body {
        ResponseBody::View {
            template: actual,
            data: actual_data,
        } => {
            assert_eq!(actual, template, "template mismatch");
            assert_eq!(actual_data, data, "view data mismatch");
        }
        other => panic!("Expected view '{template}', got {other:?}"),
    }
}

/// Asserts a success outcome.
pub fn assert_ok<T: std::fmt::Debug>(outcome: &Outcome<T>) {
    assert!(outcome.is_ok(), "Expected Ok, got {outcome:?}");
}

/// Asserts a failure outcome with the given status.
pub fn assert_err<T: std::fmt::Debug>(outcome: &Outcome<T>, status: u16) {
    match outcome {
        Outcome::Err(failure) => assert_eq!(failure.status, status, "failure status mismatch"),
        Outcome::Ok(_) => panic!("Expected Err({status}), got {outcome:?}"),
    }
}
