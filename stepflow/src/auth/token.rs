//! Signed session tokens.

use crate::core::{CookieOptions, Metadata, SameSite};
use crate::errors::StepflowError;
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Environment variable holding the signing secret.
pub const SECRET_ENV_VAR: &str = "JWT_SECRET";

/// Environment variable holding the token lifetime in seconds.
pub const EXPIRES_ENV_VAR: &str = "JWT_EXPIRES_IN_SECS";

/// Cookie carrying the session token.
pub const SESSION_COOKIE: &str = "token";

const DEVELOPMENT_SECRET: &str = "development-secret-change-me";
const DEFAULT_EXPIRES_IN: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Token signing configuration.
#[derive(Clone)]
pub struct TokenConfig {
    /// HMAC secret.
    pub secret: String,
    /// Lifetime of issued tokens.
    pub expires_in: Duration,
}

impl TokenConfig {
    /// Creates a configuration with an explicit secret and the default
    /// seven-day lifetime.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            expires_in: DEFAULT_EXPIRES_IN,
        }
    }

    /// Sets the token lifetime.
    #[must_use]
    pub const fn with_expires_in(mut self, expires_in: Duration) -> Self {
        self.expires_in = expires_in;
        self
    }

    /// Reads `JWT_SECRET` and `JWT_EXPIRES_IN_SECS`.
    ///
    /// Falls back to a development secret and seven days. An unparseable
    /// lifetime is a configuration error.
    pub fn from_env() -> Result<Self, StepflowError> {
        let secret = env::var(SECRET_ENV_VAR).unwrap_or_else(|_| {
            tracing::warn!("{SECRET_ENV_VAR} not set, using the development secret");
            DEVELOPMENT_SECRET.to_string()
        });

        let expires_in = match env::var(EXPIRES_ENV_VAR) {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| {
                    StepflowError::Config(format!("{EXPIRES_ENV_VAR} must be whole seconds, got '{raw}'"))
                })?,
            Err(_) => DEFAULT_EXPIRES_IN,
        };

        Ok(Self { secret, expires_in })
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self::new(DEVELOPMENT_SECRET)
    }
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// User id.
    pub user_id: String,
    /// User email.
    pub email: String,
    /// User role.
    pub role: String,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
}

/// Issues and verifies HS256 session tokens.
#[derive(Clone)]
pub struct TokenService {
    config: TokenConfig,
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenService {
    /// Creates a service for `config`.
    #[must_use]
    pub fn new(config: TokenConfig) -> Self {
        let encoding = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding = DecodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            encoding,
            decoding,
        }
    }

    /// The configuration in effect.
    #[must_use]
    pub const fn config(&self) -> &TokenConfig {
        &self.config
    }

    /// Builds claims for a user, issued now and expiring after the
    /// configured lifetime.
    #[must_use]
    pub fn claims_for(
        &self,
        user_id: impl Into<String>,
        email: impl Into<String>,
        role: impl Into<String>,
    ) -> Claims {
        let iat = Utc::now().timestamp();
        let lifetime = i64::try_from(self.config.expires_in.as_secs()).unwrap_or(i64::MAX);
        Claims {
            user_id: user_id.into(),
            email: email.into(),
            role: role.into(),
            exp: iat.saturating_add(lifetime),
            iat,
        }
    }

    /// Signs `claims`.
    pub fn issue(&self, claims: &Claims) -> Result<String, StepflowError> {
        jsonwebtoken::encode(&Header::default(), claims, &self.encoding)
            .map_err(|err| StepflowError::Token(err.to_string()))
    }

    /// Verifies a token's signature and expiry.
    #[must_use]
    pub fn verify(&self, token: &str) -> Option<Claims> {
        match jsonwebtoken::decode::<Claims>(token, &self.decoding, &Validation::default()) {
            Ok(data) => Some(data.claims),
            Err(err) => {
                debug!(error = %err, "Token rejected");
                None
            }
        }
    }

    /// A metadata directive setting the session cookie to `token`.
    #[must_use]
    pub fn session_cookie(&self, token: impl Into<String>) -> Metadata {
        Metadata::new().cookie_with(
            SESSION_COOKIE,
            token,
            CookieOptions::new()
                .http_only()
                .same_site(SameSite::Lax)
                .max_age(self.config.expires_in),
        )
    }

    /// A metadata directive expiring the session cookie.
    #[must_use]
    pub fn clear_session_cookie(&self) -> Metadata {
        Metadata::new().cookie_with(
            SESSION_COOKIE,
            "",
            CookieOptions::new().http_only().max_age(Duration::ZERO),
        )
    }
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DirectiveKind;
    use pretty_assertions::assert_eq;

    fn service() -> TokenService {
        TokenService::new(TokenConfig::new("test-secret"))
    }

    #[test]
    fn test_issue_and_verify() {
        let service = service();
        let claims = service.claims_for("u1", "ada@example.com", "admin");
        let token = service.issue(&claims).unwrap();

        assert_eq!(service.verify(&token), Some(claims.clone()));
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
    }

    #[test]
    fn test_claims_are_camel_case() {
        let claims = service().claims_for("u1", "a@b.co", "user");
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["userId"], "u1");
        assert!(json.get("user_id").is_none());
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = service()
            .issue(&service().claims_for("u1", "a@b.co", "user"))
            .unwrap();
        let other = TokenService::new(TokenConfig::new("another-secret"));
        assert_eq!(other.verify(&token), None);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let service = service();
        let mut claims = service.claims_for("u1", "a@b.co", "user");
        claims.iat -= 7200;
        claims.exp = claims.iat + 60;
        let token = service.issue(&claims).unwrap();
        assert_eq!(service.verify(&token), None);
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert_eq!(service().verify("not.a.token"), None);
    }

    #[test]
    fn test_session_cookie() {
        let metadata = service().session_cookie("abc");
        let directive = &metadata.directives()[0];
        assert_eq!(directive.kind(), DirectiveKind::Cookie);
        assert_eq!(directive.name(), SESSION_COOKIE);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let debug = format!("{:?}", TokenConfig::new("super-secret"));
        assert!(!debug.contains("super-secret"));
    }
}
