//! Turning an axum request into a pipeline [`Request`].

use crate::context::{cookies_from_headers, Request};
use crate::core::{Failure, FailureKind};
use axum::body::to_bytes;
use axum::extract::{FromRequestParts, Path};
use http::header::CONTENT_TYPE;
use http::HeaderMap;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Largest body the edge will buffer.
pub const BODY_LIMIT: usize = 2 * 1024 * 1024;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Reads method, path, headers, path parameters, query, cookies and body.
///
/// Fails with a 400 when the body or query string cannot be decoded.
pub(crate) async fn read_request(request: axum::extract::Request) -> Result<Request, Failure> {
    let (mut parts, body) = request.into_parts();

    let params = Path::<HashMap<String, String>>::from_request_parts(&mut parts, &())
        .await
        .map(|Path(params)| params.into_iter().map(|(k, v)| (k, Value::String(v))).collect())
        .unwrap_or_default();

    let query = match parts.uri.query() {
        Some(raw) => decode_form(raw.as_bytes())
            .map_err(|err| bad_request(format!("Invalid query string: {err}")))?,
        None => Map::new(),
    };

    let bytes = to_bytes(body, BODY_LIMIT)
        .await
        .map_err(|err| bad_request(format!("Failed to read request body: {err}")))?;
    let body = decode_body(&parts.headers, &bytes)?;
    let cookies = cookies_from_headers(&parts.headers);

    Ok(Request {
        method: parts.method,
        path: parts.uri.path().to_string(),
        headers: parts.headers,
        body,
        query,
        params,
        cookies,
    })
}

/// Decodes a body by content type: JSON, url-encoded form, otherwise text.
/// An empty body is `null`.
pub(crate) fn decode_body(headers: &HeaderMap, bytes: &[u8]) -> Result<Value, Failure> {
    if bytes.is_empty() {
        return Ok(Value::Null);
    }

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|value| value.trim().to_ascii_lowercase())
        .unwrap_or_default();

    if content_type == "application/json" || content_type.ends_with("+json") {
        serde_json::from_slice(bytes).map_err(|err| bad_request(format!("Invalid JSON body: {err}")))
    } else if content_type == FORM_CONTENT_TYPE {
        decode_form(bytes)
            .map(Value::Object)
            .map_err(|err| bad_request(format!("Invalid form body: {err}")))
    } else {
        Ok(Value::String(String::from_utf8_lossy(bytes).into_owned()))
    }
}

fn decode_form(raw: &[u8]) -> Result<Map<String, Value>, serde_urlencoded::de::Error> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(raw)?;
    Ok(pairs
        .into_iter()
        .map(|(key, value)| (key, Value::String(value)))
        .collect())
}

fn bad_request(message: String) -> Failure {
    Failure::of_kind(FailureKind::BadRequest, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn headers_with(content_type: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_str(content_type).unwrap());
        headers
    }

    #[test]
    fn test_empty_body_is_null() {
        assert_eq!(decode_body(&HeaderMap::new(), b"").unwrap(), Value::Null);
    }

    #[test]
    fn test_json_body() {
        let body = decode_body(&headers_with("application/json; charset=utf-8"), br#"{"a":1}"#);
        assert_eq!(body.unwrap(), json!({"a": 1}));

        let vendor = decode_body(&headers_with("application/vnd.api+json"), b"[1]");
        assert_eq!(vendor.unwrap(), json!([1]));
    }

    #[test]
    fn test_invalid_json_is_bad_request() {
        let err = decode_body(&headers_with("application/json"), b"{oops").unwrap_err();
        assert_eq!(err.status, 400);
        assert_eq!(err.display_name(), "BadRequest");
        assert!(err.message.starts_with("Invalid JSON body"));
    }

    #[test]
    fn test_form_body() {
        let body = decode_body(&headers_with(FORM_CONTENT_TYPE), b"email=a%40b.co&remember=true");
        assert_eq!(body.unwrap(), json!({"email": "a@b.co", "remember": "true"}));
    }

    #[test]
    fn test_other_content_is_text() {
        let body = decode_body(&headers_with("text/plain"), b"hello");
        assert_eq!(body.unwrap(), json!("hello"));
    }
}
