//! Mounting pipelines on axum routes.
//!
//! Each route handler turns the framework request into a
//! [`Request`](crate::context::Request), runs the pipeline, and writes the
//! single [`Response`](crate::dispatch::Response) back out.
//!
//! ```rust,no_run
//! use axum::Router;
//! use stepflow::http;
//! use stepflow::prelude::*;
//! use serde_json::json;
//!
//! let health = Pipeline::builder("health")
//!     .step_fn("ok", |_data, _ctx| async move { Ok(Outcome::ok(json!({"status": "ok"}))) })
//!     .build()
//!     .unwrap();
//!
//! let app: Router = Router::new().route("/health", http::get(health));
//! ```

mod extract;
mod respond;

use crate::pipeline::Pipeline;
use axum::routing::{MethodFilter, MethodRouter};
use tracing::warn;

pub use extract::BODY_LIMIT;

/// Runs `pipeline` against an axum request.
pub async fn serve(pipeline: &Pipeline, request: axum::extract::Request) -> axum::response::Response {
    match extract::read_request(request).await {
        Ok(request) => {
            let response = pipeline.handle(request).await;
            respond::into_http_response(pipeline, response)
        }
        Err(failure) => {
            warn!(pipeline = pipeline.name(), error = %failure.message, "Rejected undecodable request");
            respond::into_http_response(pipeline, pipeline.failure_response(failure))
        }
    }
}

/// Routes requests matching `filter` to `pipeline`.
pub fn on<S>(filter: MethodFilter, pipeline: Pipeline) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    axum::routing::on(filter, move |request: axum::extract::Request| async move {
        serve(&pipeline, request).await
    })
}

/// Routes `GET` requests to `pipeline`.
pub fn get<S>(pipeline: Pipeline) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    on(MethodFilter::GET, pipeline)
}

/// Routes `POST` requests to `pipeline`.
pub fn post<S>(pipeline: Pipeline) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    on(MethodFilter::POST, pipeline)
}

/// Routes `PUT` requests to `pipeline`.
pub fn put<S>(pipeline: Pipeline) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    on(MethodFilter::PUT, pipeline)
}

/// Routes `PATCH` requests to `pipeline`.
pub fn patch<S>(pipeline: Pipeline) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    on(MethodFilter::PATCH, pipeline)
}

/// Routes `DELETE` requests to `pipeline`.
pub fn delete<S>(pipeline: Pipeline) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    on(MethodFilter::DELETE, pipeline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RequestContext;
    use crate::core::{CookieOptions, Metadata, Outcome};
    use crate::dispatch::MockTemplateRenderer;
    use crate::errors::RenderError;
    use crate::validation::{FieldRule, ObjectSchema};
    use axum::body::Body;
    use axum::Router;
    use http::header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
    use http::StatusCode;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn echo() -> Pipeline {
        Pipeline::builder("echo")
            .step_fn("echo", |_data, ctx: RequestContext| async move {
                Ok(Outcome::ok(json!({
                    "method": ctx.method().as_str(),
                    "path": ctx.path(),
                    "body": ctx.body(),
                    "query": ctx.query(),
                    "params": ctx.params(),
                    "cookies": ctx.cookies(),
                })))
            })
            .build()
            .unwrap()
    }

    async fn send(app: Router, request: http::Request<Body>) -> (StatusCode, http::HeaderMap, Vec<u8>) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, headers, bytes.to_vec())
    }

    fn json_of(bytes: &[u8]) -> Value {
        serde_json::from_slice(bytes).unwrap()
    }

    #[tokio::test]
    async fn test_request_facets_reach_steps() {
        let app = Router::new().route("/tasks/:id", post(echo()));
        let request = http::Request::builder()
            .method("POST")
            .uri("/tasks/42?verbose=true")
            .header(CONTENT_TYPE, "application/json")
            .header(COOKIE, "token=abc; theme=dark")
            .body(Body::from(r#"{"title":"Ship it"}"#))
            .unwrap();

        let (status, _, body) = send(app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json_of(&body),
            json!({
                "method": "POST",
                "path": "/tasks/42",
                "body": {"title": "Ship it"},
                "query": {"verbose": "true"},
                "params": {"id": "42"},
                "cookies": {"token": "abc", "theme": "dark"},
            })
        );
    }

    #[tokio::test]
    async fn test_form_body_and_missing_body() {
        let app = Router::new().route("/login", on(MethodFilter::POST.or(MethodFilter::GET), echo()));

        let form = http::Request::builder()
            .method("POST")
            .uri("/login")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("email=a%40b.co"))
            .unwrap();
        let (_, _, body) = send(app.clone(), form).await;
        assert_eq!(json_of(&body)["body"], json!({"email": "a@b.co"}));

        let empty = http::Request::builder().uri("/login").body(Body::empty()).unwrap();
        let (_, _, body) = send(app, empty).await;
        assert_eq!(json_of(&body)["body"], Value::Null);
        assert_eq!(json_of(&body)["params"], json!({}));
    }

    #[tokio::test]
    async fn test_invalid_json_is_rejected_before_the_pipeline() {
        let app = Router::new().route("/tasks", post(echo()));
        let request = http::Request::builder()
            .method("POST")
            .uri("/tasks")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let (status, _, body) = send(app, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body = json_of(&body);
        assert_eq!(body["name"], "BadRequest");
        assert!(body.get("stack").is_none());
    }

    #[tokio::test]
    async fn test_validation_failure_over_http() {
        let pipeline = Pipeline::builder("signup")
            .body_schema(ObjectSchema::new().field("email", FieldRule::email()))
            .step_fn("never", |_data, _ctx| async move { Ok(Outcome::ok(json!("ran"))) })
            .build()
            .unwrap();
        let app = Router::new().route("/signup", post(pipeline));
        let request = http::Request::builder()
            .method("POST")
            .uri("/signup")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"email":"nope"}"#))
            .unwrap();

        let (status, _, body) = send(app, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            json_of(&body)["error"],
            "Validation failed: body.email: Invalid email format"
        );
    }

    #[tokio::test]
    async fn test_headers_and_cookies_are_written() {
        let pipeline = Pipeline::builder("login")
            .step_fn("session", |_data, _ctx| async move {
                Ok(Outcome::ok_with_metadata(
                    json!({"ok": true}),
                    Metadata::new()
                        .header("X-Request-Source", "api")
                        .cookie_with("token", "jwt", CookieOptions::new().http_only())
                        .cookie("theme", "dark"),
                ))
            })
            .build()
            .unwrap();
        let app = Router::new().route("/login", post(pipeline));
        let request = http::Request::builder()
            .method("POST")
            .uri("/login")
            .body(Body::empty())
            .unwrap();

        let (status, headers, _) = send(app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers.get("x-request-source").unwrap(), "api");
        let cookies: Vec<_> = headers
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        assert_eq!(
            cookies,
            vec!["token=jwt; Path=/; HttpOnly".to_string(), "theme=dark; Path=/".to_string()]
        );
    }

    #[tokio::test]
    async fn test_redirect_sets_location() {
        let pipeline = Pipeline::builder("logout")
            .step_fn("leave", |_data, _ctx| async move {
                Ok(Outcome::ok(json!({"redirect": "/login"})))
            })
            .build()
            .unwrap();
        let app = Router::new().route("/logout", post(pipeline));
        let request = http::Request::builder()
            .method("POST")
            .uri("/logout")
            .body(Body::empty())
            .unwrap();

        let (status, headers, _) = send(app, request).await;

        assert_eq!(status, StatusCode::FOUND);
        assert_eq!(headers.get(LOCATION).unwrap(), "/login");
    }

    #[tokio::test]
    async fn test_view_uses_renderer() {
        let mut renderer = MockTemplateRenderer::new();
        renderer
            .expect_render()
            .withf(|template, data| template == "tasks/index" && data["count"] == 2)
            .times(1)
            .returning(|_, _| Ok("<h1>2 tasks</h1>".to_string()));

        let pipeline = Pipeline::builder("page")
            .renderer(Arc::new(renderer))
            .step_fn("page", |_data, _ctx| async move {
                Ok(Outcome::ok(json!({"view": "tasks/index", "data": {"count": 2}})))
            })
            .build()
            .unwrap();
        let app = Router::new().route("/tasks", get(pipeline));
        let request = http::Request::builder().uri("/tasks").body(Body::empty()).unwrap();

        let (status, headers, body) = send(app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert!(headers
            .get(CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/html"));
        assert_eq!(body, b"<h1>2 tasks</h1>".to_vec());
    }

    #[tokio::test]
    async fn test_render_failure_is_500() {
        let mut renderer = MockTemplateRenderer::new();
        renderer
            .expect_render()
            .returning(|template, _| Err(RenderError::new(template, "missing partial")));

        let pipeline = Pipeline::builder("page")
            .renderer(Arc::new(renderer))
            .step_fn("page", |_data, _ctx| async move {
                Ok(Outcome::ok_with_metadata(
                    json!({"view": "tasks/index"}),
                    Metadata::new().header("X-Page", "tasks"),
                ))
            })
            .build()
            .unwrap();
        let app = Router::new().route("/tasks", get(pipeline));
        let request = http::Request::builder().uri("/tasks").body(Body::empty()).unwrap();

        let (status, headers, body) = send(app, request).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(headers.get("x-page").is_none());
        let body = json_of(&body);
        assert_eq!(body["name"], "RenderError");
        assert_eq!(
            body["error"],
            "Failed to render template 'tasks/index': missing partial"
        );
    }

    #[tokio::test]
    async fn test_view_without_renderer_is_500() {
        let pipeline = Pipeline::builder("page")
            .step_fn("page", |_data, _ctx| async move {
                Ok(Outcome::ok(json!({"view": "home"})))
            })
            .build()
            .unwrap();
        let app = Router::new().route("/", get(pipeline));
        let request = http::Request::builder().uri("/").body(Body::empty()).unwrap();

        let (status, _, body) = send(app, request).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_of(&body)["name"], "RenderError");
    }
}
