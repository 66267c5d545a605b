//! Structured validation failures.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The four addressable request facets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facet {
    /// Parsed request body.
    Body,
    /// Query-string map.
    Query,
    /// Path parameters.
    Params,
    /// Request cookies.
    Cookies,
}

impl Facet {
    /// All facets in parse order.
    pub const ALL: [Self; 4] = [Self::Body, Self::Query, Self::Params, Self::Cookies];

    /// Returns the facet's field name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Body => "body",
            Self::Query => "query",
            Self::Params => "params",
            Self::Cookies => "cookies",
        }
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single problem found while parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Dotted path inside the facet; empty for the facet itself.
    pub path: String,
    /// What is wrong.
    pub message: String,
}

impl Issue {
    /// Creates an issue.
    #[must_use]
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A schema rejected its input.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub struct ValidationError {
    /// The facet that failed, once known.
    pub facet: Option<Facet>,
    /// Everything that was wrong, in discovery order.
    pub issues: Vec<Issue>,
}

impl ValidationError {
    /// Creates an error from a list of issues.
    #[must_use]
    pub const fn new(issues: Vec<Issue>) -> Self {
        Self {
            facet: None,
            issues,
        }
    }

    /// Creates an error with one issue.
    #[must_use]
    pub fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(vec![Issue::new(path, message)])
    }

    /// Attributes the error to a facet.
    #[must_use]
    pub const fn with_facet(mut self, facet: Facet) -> Self {
        self.facet = Some(facet);
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Validation failed")?;
        if self.issues.is_empty() {
            return Ok(());
        }

        f.write_str(": ")?;
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            let location = match (self.facet, issue.path.is_empty()) {
                (Some(facet), true) => facet.to_string(),
                (Some(facet), false) => format!("{facet}.{}", issue.path),
                (None, _) => issue.path.clone(),
            };
            if location.is_empty() {
                f.write_str(&issue.message)?;
            } else {
                write!(f, "{location}: {}", issue.message)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_without_issues() {
        assert_eq!(ValidationError::new(Vec::new()).to_string(), "Validation failed");
    }

    #[test]
    fn test_display_with_facet() {
        let err = ValidationError::new(vec![
            Issue::new("email", "Required"),
            Issue::new("password", "Must be at least 8 characters"),
        ])
        .with_facet(Facet::Body);

        assert_eq!(
            err.to_string(),
            "Validation failed: body.email: Required; body.password: Must be at least 8 characters"
        );
    }

    #[test]
    fn test_display_facet_level_issue() {
        let err = ValidationError::single("", "Expected object").with_facet(Facet::Query);
        assert_eq!(err.to_string(), "Validation failed: query: Expected object");

        let bare = ValidationError::single("", "missing field `id`");
        assert_eq!(bare.to_string(), "Validation failed: missing field `id`");
    }
}
