//! Side-channel metadata carried by successful outcomes.
//!
//! Metadata has two parts: free-form extension values that later steps can
//! read from the context, and an ordered list of [`Directive`]s telling the
//! dispatcher which headers and cookies to set on a successful response.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// `SameSite` attribute of a cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    /// `SameSite=Strict`
    Strict,
    /// `SameSite=Lax`
    Lax,
    /// `SameSite=None`
    None,
}

impl SameSite {
    /// Returns the attribute value as written in `Set-Cookie`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "Strict",
            Self::Lax => "Lax",
            Self::None => "None",
        }
    }
}

/// Option bag applied to a cookie directive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieOptions {
    /// Hide the cookie from client scripts.
    #[serde(default)]
    pub http_only: bool,
    /// Only send over HTTPS.
    #[serde(default)]
    pub secure: bool,
    /// Cross-site policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_site: Option<SameSite>,
    /// Lifetime in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age: Option<i64>,
    /// Cookie path; `/` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Cookie domain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Absolute expiry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,
}

impl CookieOptions {
    /// Creates an empty option bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the cookie http-only.
    #[must_use]
    pub const fn http_only(mut self) -> Self {
        self.http_only = true;
        self
    }

    /// Marks the cookie secure.
    #[must_use]
    pub const fn secure(mut self) -> Self {
        self.secure = true;
        self
    }

    /// Sets the `SameSite` policy.
    #[must_use]
    pub const fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }

    /// Sets the max age.
    #[must_use]
    pub fn max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX));
        self
    }

    /// Sets the cookie path.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Sets the cookie domain.
    #[must_use]
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Sets an absolute expiry.
    #[must_use]
    pub const fn expires(mut self, at: DateTime<Utc>) -> Self {
        self.expires = Some(at);
        self
    }
}

/// Which response facet a directive targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    /// A response header.
    Header,
    /// A response cookie.
    Cookie,
}

/// An instruction for the dispatcher to set a header or cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Directive {
    /// Set a response header.
    Header {
        /// Header name.
        name: String,
        /// Header value.
        value: String,
    },
    /// Set a response cookie.
    Cookie {
        /// Cookie name.
        name: String,
        /// Cookie value.
        value: String,
        /// Cookie attributes.
        #[serde(default)]
        options: CookieOptions,
    },
}

impl Directive {
    /// Returns the directive kind.
    #[must_use]
    pub const fn kind(&self) -> DirectiveKind {
        match self {
            Self::Header { .. } => DirectiveKind::Header,
            Self::Cookie { .. } => DirectiveKind::Cookie,
        }
    }

    /// Returns the header or cookie name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Header { name, .. } | Self::Cookie { name, .. } => name,
        }
    }

    fn targets_same(&self, other: &Self) -> bool {
        if self.kind() != other.kind() {
            return false;
        }
        match self.kind() {
            // Header names are case-insensitive.
            DirectiveKind::Header => self.name().eq_ignore_ascii_case(other.name()),
            DirectiveKind::Cookie => self.name() == other.name(),
        }
    }
}

/// Metadata returned alongside successful step data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Free-form extension values.
    #[serde(default)]
    values: Map<String, Value>,
    /// Header and cookie directives in application order.
    #[serde(default)]
    directives: Vec<Directive>,
}

impl Metadata {
    /// Creates empty metadata.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an extension value.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.insert(key, value);
        self
    }

    /// Adds a header directive.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push_directive(Directive::Header {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Adds a cookie directive with default options.
    #[must_use]
    pub fn cookie(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookie_with(name, value, CookieOptions::default())
    }

    /// Adds a cookie directive with explicit options.
    #[must_use]
    pub fn cookie_with(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
        options: CookieOptions,
    ) -> Self {
        self.push_directive(Directive::Cookie {
            name: name.into(),
            value: value.into(),
            options,
        });
        self
    }

    /// Inserts an extension value, replacing any previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    /// Removes an extension value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    /// Adds a directive. A directive for the same header or cookie
    /// replaces the earlier one in place.
    pub fn push_directive(&mut self, directive: Directive) {
        if let Some(existing) = self
            .directives
            .iter_mut()
            .find(|existing| existing.targets_same(&directive))
        {
            *existing = directive;
        } else {
            self.directives.push(directive);
        }
    }

    /// Gets an extension value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Returns all extension values.
    #[must_use]
    pub const fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Returns the directives in application order.
    #[must_use]
    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    /// Returns true when there are neither values nor directives.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.directives.is_empty()
    }

    /// Overlays `other` onto `self`.
    ///
    /// Values under any of the `protected` keys are skipped and their keys
    /// returned. Directives follow [`Metadata::push_directive`] semantics.
    pub fn overlay(&mut self, other: Self, protected: &[&str]) -> Vec<String> {
        let mut dropped = Vec::new();
        for (key, value) in other.values {
            if protected.contains(&key.as_str()) {
                dropped.push(key);
            } else {
                self.values.insert(key, value);
            }
        }
        for directive in other.directives {
            self.push_directive(directive);
        }
        dropped
    }
}
