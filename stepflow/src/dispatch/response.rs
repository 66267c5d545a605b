//! Framework-neutral HTTP response produced by a pipeline run.

use crate::core::CookieOptions;
use crate::utils::http_date;
use serde_json::Value;

/// The single body a response carries.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// A JSON document.
    Json(Value),
    /// A redirect to the given location.
    Redirect(String),
    /// A named template rendered with `data`.
    View {
        /// Template name, e.g. `tasks/index`.
        template: String,
        /// Data handed to the template.
        data: Value,
    },
}

/// A cookie to set on the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value.
    pub value: String,
    /// Cookie attributes.
    pub options: CookieOptions,
}

impl SetCookie {
    /// Creates a cookie.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>, options: CookieOptions) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            options,
        }
    }

    /// Renders the `Set-Cookie` header value.
    ///
    /// The value is percent-encoded so `;`, `,` and whitespace cannot end it
    /// early or inject attributes.
    #[must_use]
    pub fn to_header_value(&self) -> String {
        let mut out = format!("{}={}", self.name, urlencoding::encode(&self.value));
        let options = &self.options;

        if let Some(max_age) = options.max_age {
            out.push_str(&format!("; Max-Age={max_age}"));
        }
        if let Some(ref domain) = options.domain {
            out.push_str(&format!("; Domain={domain}"));
        }
        out.push_str(&format!("; Path={}", options.path.as_deref().unwrap_or("/")));
        if let Some(ref expires) = options.expires {
            out.push_str(&format!("; Expires={}", http_date(expires)));
        }
        if options.http_only {
            out.push_str("; HttpOnly");
        }
        if options.secure {
            out.push_str("; Secure");
        }
        if let Some(same_site) = options.same_site {
            out.push_str(&format!("; SameSite={}", same_site.as_str()));
        }
        out
    }
}

/// The one observable response of a pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    /// Headers in application order.
    pub headers: Vec<(String, String)>,
    /// Cookies in application order.
    pub cookies: Vec<SetCookie>,
    /// The body.
    pub body: ResponseBody,
}

impl Response {
    /// Creates a response with no headers or cookies.
    #[must_use]
    pub const fn new(status: u16, body: ResponseBody) -> Self {
        Self {
            status,
            headers: Vec::new(),
            cookies: Vec::new(),
            body,
        }
    }

    /// JSON response.
    #[must_use]
    pub const fn json(status: u16, value: Value) -> Self {
        Self::new(status, ResponseBody::Json(value))
    }

    /// Redirect response.
    #[must_use]
    pub fn redirect(status: u16, location: impl Into<String>) -> Self {
        Self::new(status, ResponseBody::Redirect(location.into()))
    }

    /// Rendered-template response.
    #[must_use]
    pub fn view(status: u16, template: impl Into<String>, data: Value) -> Self {
        Self::new(
            status,
            ResponseBody::View {
                template: template.into(),
                data,
            },
        )
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Adds a cookie.
    #[must_use]
    pub fn with_cookie(mut self, cookie: SetCookie) -> Self {
        self.cookies.push(cookie);
        self
    }

    /// Looks up a header, case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .rev()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Looks up a cookie by name.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&SetCookie> {
        self.cookies.iter().rev().find(|cookie| cookie.name == name)
    }

    /// Returns the JSON body, if this is a JSON response.
    #[must_use]
    pub const fn json_body(&self) -> Option<&Value> {
        match &self.body {
            ResponseBody::Json(value) => Some(value),
            _ => None,
        }
    }
}
