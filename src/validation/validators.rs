//! Custom checks for finance input, in the shape `validator` expects.
//!
//! They plug into both `#[validate(custom(function = ...))]` on typed
//! request structs and [`Field::check`](super::Field::check) on declarative
//! schemas.

use std::borrow::Cow;
use validator::ValidationError;

fn failure(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

/// Validates that a string is a UUID.
pub fn validate_uuid(id: &str) -> Result<(), ValidationError> {
    uuid::Uuid::parse_str(id).map_err(|_| failure("uuid", "must be a valid UUID"))?;
    Ok(())
}

/// Validates an ISO 4217 style currency code: three uppercase ASCII letters.
///
/// # Example
///
/// ```rust
/// use ledgergate::validation::validate_currency_code;
///
/// assert!(validate_currency_code("EUR").is_ok());
/// assert!(validate_currency_code("eur").is_err());
/// ```
pub fn validate_currency_code(code: &str) -> Result<(), ValidationError> {
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase()) {
        Ok(())
    } else {
        Err(failure("currency", "must be a 3-letter uppercase currency code"))
    }
}

/// Validates that a string has at least one non-whitespace character.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(failure("blank", "must not be blank"))
    } else {
        Ok(())
    }
}

/// Validates a hex color such as `#1A2B3C`, used for category labels.
pub fn validate_hex_color(color: &str) -> Result<(), ValidationError> {
    let valid = color
        .strip_prefix('#')
        .is_some_and(|hex| hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()));
    if valid {
        Ok(())
    } else {
        Err(failure("color", "must be a hex color like #1A2B3C"))
    }
}
