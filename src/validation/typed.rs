use super::error::{FieldError, InputSource, field_errors_from};
use super::{InputSchema, Schema};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::collections::HashSet;
use std::marker::PhantomData;
use validator::Validate;

/// Schema backed by a Rust type deriving `Deserialize` and `Validate`.
///
/// `shape` declares the presence and type of each field `T` reads. The raw
/// value is checked against it first, so every missing or mistyped field is
/// reported at once. `T`'s `validator` constraints then run on the fields
/// that passed, with failed fields replaced by placeholders, so constraint
/// violations are reported alongside shape errors. On success the value is
/// deserialized into `T` and serialized back as the normalized value, so
/// serde defaults and renames take effect.
///
/// Errors are sorted by field path.
///
/// # Example
///
/// ```rust
/// use ledgergate::validation::{Field, InputSchema, Schema, TypedSchema};
/// use serde::{Deserialize, Serialize};
/// use validator::Validate;
///
/// #[derive(Serialize, Deserialize, Validate)]
/// struct CreateVendor {
///     #[validate(length(min = 1, max = 100))]
///     name: String,
///     rank: i64,
/// }
///
/// let schema = TypedSchema::<CreateVendor>::new(
///     Schema::object()
///         .field("name", Field::string())
///         .field("rank", Field::integer()),
/// );
/// let errors = schema.validate(serde_json::json!({"name": ""})).unwrap_err();
/// assert_eq!(errors.len(), 2);
/// ```
pub struct TypedSchema<T> {
    shape: Schema,
    _marker: PhantomData<fn() -> T>,
}

impl<T> TypedSchema<T> {
    pub fn new(shape: Schema) -> Self {
        Self {
            shape,
            _marker: PhantomData,
        }
    }
}

impl<T> InputSchema for TypedSchema<T>
where
    T: DeserializeOwned + Serialize + Validate,
{
    fn validate(&self, raw: Value) -> Result<Value, Vec<FieldError>> {
        self.validate_from(InputSource::Body, raw)
    }

    fn validate_from(&self, source: InputSource, raw: Value) -> Result<Value, Vec<FieldError>> {
        let (mut fields, mut errors) = self.shape.partial(source, &raw).map_err(|e| vec![e])?;

        let failed: HashSet<String> = errors.iter().map(|e| top_level(&e.field).to_string()).collect();
        for name in &failed {
            if let Some(field) = self.shape.get(name) {
                fields.insert(name.clone(), field.placeholder());
            }
        }

        let value = match serde_json::from_value::<T>(Value::Object(fields)) {
            Ok(value) => value,
            Err(_) if !errors.is_empty() => {
                errors.sort_by(|a, b| a.field.cmp(&b.field));
                return Err(errors);
            }
            Err(e) => return Err(vec![FieldError::new("", e.to_string())]),
        };

        if let Err(violations) = value.validate() {
            errors.extend(
                field_errors_from(&violations)
                    .into_iter()
                    .filter(|e| !failed.contains(top_level(&e.field))),
            );
        }

        if errors.is_empty() {
            serde_json::to_value(&value).map_err(|e| vec![FieldError::new("", e.to_string())])
        } else {
            errors.sort_by(|a, b| a.field.cmp(&b.field));
            Err(errors)
        }
    }
}

/// `splits[1].amount` -> `splits`
fn top_level(path: &str) -> &str {
    path.split(['.', '[']).next().unwrap_or(path)
}
