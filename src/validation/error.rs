use serde::{Deserialize, Serialize};
use std::fmt;
use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

/// Where a piece of request input came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputSource {
    Params,
    Body,
    Query,
}

impl InputSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Params => "params",
            Self::Body => "body",
            Self::Query => "query",
        }
    }
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single violated constraint, addressed by its field path
/// (`name`, `address.city`, `splits[1].amount`).
///
/// An empty `field` means the input as a whole was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.field.is_empty()
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.field, self.message)
        }
    }
}

/// Flattens `validator` errors (including nested structs and lists) into
/// field errors, sorted by field path.
pub fn field_errors_from(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut out = Vec::new();
    collect(errors, "", &mut out);
    out.sort_by(|a, b| a.field.cmp(&b.field));
    out
}

fn collect(errors: &ValidationErrors, prefix: &str, out: &mut Vec<FieldError>) {
    for (field, kind) in errors.errors() {
        let name = field.to_string();
        let path = if name == "__all__" {
            prefix.to_string()
        } else {
            join_path(prefix, &name)
        };

        match kind {
            ValidationErrorsKind::Field(list) => {
                out.extend(list.iter().map(|e| FieldError::new(path.clone(), describe(e))));
            }
            ValidationErrorsKind::Struct(inner) => collect(inner, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect(inner, &format!("{path}[{index}]"), out);
                }
            }
        }
    }
}

pub(crate) fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

/// Renders a `validator` error as a human-readable message.
///
/// Explicit messages win; otherwise the built-in codes are described from
/// their parameters.
pub fn describe(error: &ValidationError) -> String {
    if let Some(message) = &error.message {
        return message.to_string();
    }

    let param = |key: &str| error.params.get(key).and_then(|v| v.as_u64());

    match &*error.code {
        "length" => match (param("equal"), param("min"), param("max")) {
            (Some(n), _, _) => format!("must be exactly {}", characters(n as usize)),
            (None, Some(min), Some(max)) => {
                format!("must be between {min} and {}", characters(max as usize))
            }
            (None, Some(min), None) => format!("must be at least {}", characters(min as usize)),
            (None, None, Some(max)) => format!("must be at most {}", characters(max as usize)),
            _ => "has an invalid length".to_string(),
        },
        "range" => {
            let bound = |key: &str| error.params.get(key).map(|v| v.to_string());
            match (bound("min"), bound("max")) {
                (Some(min), Some(max)) => format!("must be between {min} and {max}"),
                (Some(min), None) => format!("must be at least {min}"),
                (None, Some(max)) => format!("must be at most {max}"),
                _ => "is out of range".to_string(),
            }
        }
        "email" => "must be a valid email address".to_string(),
        "url" => "must be a valid URL".to_string(),
        "required" => "is required".to_string(),
        code => format!("is invalid ({code})"),
    }
}

pub(crate) fn characters(n: usize) -> String {
    if n == 1 {
        "1 character".to_string()
    } else {
        format!("{n} characters")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Nested {
        #[validate(length(min = 2))]
        city: String,
    }

    #[derive(Validate)]
    struct Payload {
        #[validate(length(min = 1, max = 100))]
        name: String,
        #[validate(email)]
        email: String,
        #[validate(nested)]
        address: Nested,
    }

    #[test]
    fn test_field_errors_are_flattened_and_sorted() {
        let payload = Payload {
            name: String::new(),
            email: "nope".to_string(),
            address: Nested {
                city: "A".to_string(),
            },
        };

        let errors = field_errors_from(&payload.validate().unwrap_err());
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["address.city", "email", "name"]);
        assert_eq!(errors[0].message, "must be at least 2 characters");
        assert_eq!(errors[1].message, "must be a valid email address");
        assert_eq!(errors[2].message, "must be between 1 and 100 characters");
    }

    #[test]
    fn test_explicit_message_wins() {
        let mut err = ValidationError::new("currency");
        err.message = Some("must be a 3-letter currency code".into());
        assert_eq!(describe(&err), "must be a 3-letter currency code");
    }

    #[test]
    fn test_unknown_code_is_named() {
        let err = ValidationError::new("slug");
        assert_eq!(describe(&err), "is invalid (slug)");
    }

    #[test]
    fn test_field_error_display() {
        assert_eq!(FieldError::new("name", "is required").to_string(), "name: is required");
        assert_eq!(FieldError::new("", "must be a JSON object").to_string(), "must be a JSON object");
    }

    #[test]
    fn test_input_source_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&InputSource::Params).unwrap(), "\"params\"");
        assert_eq!(InputSource::Query.to_string(), "query");
    }
}
