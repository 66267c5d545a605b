//! The authentication step.

use super::token::{TokenService, SESSION_COOKIE};
use crate::context::RequestContext;
use crate::core::Outcome;
use crate::steps::Step;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Where a token may be read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Session cookie, then `Authorization: Bearer`.
    Api,
    /// Session cookie only.
    Web,
}

/// Verifies the caller's token and passes its claims on as data.
#[derive(Debug, Clone)]
pub struct Authenticate {
    service: Arc<TokenService>,
    mode: AuthMode,
}

impl Authenticate {
    /// Creates the step.
    #[must_use]
    pub const fn new(service: Arc<TokenService>, mode: AuthMode) -> Self {
        Self { service, mode }
    }

    fn token<'a>(&self, ctx: &'a RequestContext) -> Option<&'a str> {
        let cookie = ctx.cookie(SESSION_COOKIE).filter(|token| !token.is_empty());
        match self.mode {
            AuthMode::Web => cookie,
            AuthMode::Api => cookie.or_else(|| {
                ctx.header("authorization")
                    .and_then(|value| value.strip_prefix("Bearer "))
                    .map(str::trim)
                    .filter(|token| !token.is_empty())
            }),
        }
    }
}

#[async_trait]
impl Step for Authenticate {
    fn name(&self) -> &str {
        "authenticate"
    }

    async fn run(&self, _data: Value, ctx: &RequestContext) -> anyhow::Result<Outcome> {
        let Some(token) = self.token(ctx) else {
            return Ok(Outcome::unauthorized("No token provided"));
        };

        match self.service.verify(token) {
            Some(claims) => Ok(Outcome::ok(serde_json::to_value(claims)?)),
            None => Ok(Outcome::unauthorized("Invalid token")),
        }
    }
}

/// Shorthand for [`Authenticate::new`].
#[must_use]
pub const fn authenticate(service: Arc<TokenService>, mode: AuthMode) -> Authenticate {
    Authenticate::new(service, mode)
}
