//! Test fixtures for requests and contexts.

use serde_json::Value;
use uuid::Uuid;

use crate::context::{Request, RequestContext, RequestInput};
use crate::dispatch::ResponseChannel;

/// A `GET /test` request with no facets.
#[must_use]
pub fn test_request() -> Request {
    Request::get("/test")
}

/// A `POST` request carrying a JSON body.
#[must_use]
pub fn json_request(path: &str, body: Value) -> Request {
    Request::post(path)
        .with_header("content-type", "application/json")
        .with_body(body)
}

/// A context for `GET /test`, as a step would receive it.
#[must_use]
pub fn test_context() -> RequestContext {
    context_for(test_request())
}

/// A context for `request`, with facets taken as-is.
#[must_use]
pub fn context_for(request: Request) -> RequestContext {
    RequestContext::new(
        RequestInput::from(request),
        Uuid::new_v4(),
        ResponseChannel::new(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fixtures() {
        let ctx = test_context();
        assert_eq!(ctx.path(), "/test");
        assert!(!ctx.response().is_written());

        let request = json_request("/tasks", json!({"title": "x"}));
        assert_eq!(request.headers.get("content-type").unwrap(), "application/json");
        assert_eq!(context_for(request).body(), &json!({"title": "x"}));
    }
}
