//! Request validation.
//!
//! Each of the four request facets (body, query, path parameters, cookies)
//! may have one [`Schema`]. Configured facets are parsed before any step
//! runs; unconfigured facets pass through unchanged.

mod adapter;
mod error;
mod object;
mod schema;

pub use adapter::{validate_request, ValidationSchemas};
pub use error::{Facet, Issue, ValidationError};
pub use object::{FieldRule, ObjectSchema};
pub use schema::{Schema, SerdeSchema};
