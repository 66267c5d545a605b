//! `Cookie` request header parsing.

use http::header::COOKIE;
use http::HeaderMap;
use serde_json::{Map, Value};
use std::borrow::Cow;

/// Parses one `Cookie` header value into name/value pairs.
///
/// Pairs without `=` are skipped, surrounding quotes are removed, values are
/// percent-decoded and the first occurrence of a name wins. A value that does
/// not decode to UTF-8 is kept as sent.
#[must_use]
pub fn parse_cookie_header(raw: &str) -> Map<String, Value> {
    let mut cookies = Map::new();
    for pair in raw.split(';') {
        let Some((name, value)) = pair.split_once('=') else {
            continue;
        };
        let name = name.trim();
        if name.is_empty() || cookies.contains_key(name) {
            continue;
        }
        let value = value.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(value);
        let value = urlencoding::decode(value)
            .map(Cow::into_owned)
            .unwrap_or_else(|_| value.to_string());
        cookies.insert(name.to_string(), Value::String(value));
    }
    cookies
}

/// Collects cookies from every `Cookie` header.
#[must_use]
pub fn cookies_from_headers(headers: &HeaderMap) -> Map<String, Value> {
    let mut cookies = Map::new();
    for raw in headers.get_all(COOKIE).iter().filter_map(|v| v.to_str().ok()) {
        for (name, value) in parse_cookie_header(raw) {
            cookies.entry(name).or_insert(value);
        }
    }
    cookies
}
