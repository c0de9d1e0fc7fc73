//! Request input validation.
//!
//! Route contracts attach an [`InputSchema`] to each of params, body and
//! query. Two implementations are provided: the declarative [`Schema`] and
//! [`TypedSchema`], which reuses a `serde` + `validator` struct.
//!
//! # Example
//!
//! ```rust
//! use ledgergate::validation::{Field, InputSchema, Schema};
//! use serde_json::json;
//!
//! let schema = Schema::object()
//!     .field("limit", Field::integer().min(1).max(100).default(20));
//!
//! let errors = schema.validate(json!({"limit": 0})).unwrap_err();
//! assert_eq!(errors[0].to_string(), "limit: must be at least 1");
//! ```

mod error;
mod schema;
mod typed;
mod validators;

pub use error::{FieldError, InputSource, describe, field_errors_from};
pub use schema::{Field, Schema, StringCheck};
pub use typed::TypedSchema;
pub use validators::{validate_currency_code, validate_hex_color, validate_not_blank, validate_uuid};
pub use validator;

use serde_json::Value;

/// Validates and normalizes one piece of request input.
///
/// Implementations must be pure: the same raw value always yields the same
/// outcome. Every violation of the schema is reported, not just the first.
pub trait InputSchema: Send + Sync {
    /// Validates a JSON value, such as a request body.
    fn validate(&self, raw: Value) -> Result<Value, Vec<FieldError>>;

    /// Validates input read from `source`. Params and query values arrive
    /// as strings, so implementations may read scalars from text there.
    fn validate_from(&self, _source: InputSource, raw: Value) -> Result<Value, Vec<FieldError>> {
        self.validate(raw)
    }
}
