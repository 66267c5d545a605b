//! Token-based authentication.
//!
//! [`TokenService`] issues and verifies signed session tokens, and
//! [`authenticate`] is a step that rejects unauthenticated requests with a
//! 401 and otherwise passes the token's [`Claims`] on as data.

mod step;
mod token;

pub use step::{authenticate, AuthMode, Authenticate};
pub use token::{
    Claims, TokenConfig, TokenService, EXPIRES_ENV_VAR, SECRET_ENV_VAR, SESSION_COOKIE,
};
