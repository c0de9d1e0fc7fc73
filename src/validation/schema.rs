//! Declarative, JSON-shaped input schemas.
//!
//! A [`Schema`] describes an object: its fields, their types, constraints,
//! presence and nullability. Validating a value produces a normalized copy
//! (unknown keys dropped, defaults applied) or every violation found, in
//! declaration order.
//!
//! JSON bodies are checked strictly. Params and query strings carry every
//! scalar as text, so for those sources integers, numbers and booleans are
//! also read from their string form, and a single value may stand in for a
//! one-item array.

use super::InputSchema;
use super::error::{FieldError, InputSource, characters, describe, join_path};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde_json::{Map, Value};
use validator::{ValidateEmail, ValidationError};

/// Extra check on a string value, in the shape `validator` custom functions use.
pub type StringCheck = fn(&str) -> Result<(), ValidationError>;

#[derive(Clone)]
enum Rule {
    String,
    Email,
    Uuid,
    Enum(Vec<String>),
    Integer,
    Number,
    Boolean,
    Date,
    DateTime,
    Array(Box<Field>),
    Object(Schema),
    Any,
}

/// One field of a [`Schema`].
///
/// Presence and nullability are independent: `optional()` allows the key to
/// be absent, `nullable()` allows an explicit `null`.
#[derive(Clone)]
pub struct Field {
    rule: Rule,
    required: bool,
    nullable: bool,
    default: Option<Value>,
    min_len: Option<usize>,
    max_len: Option<usize>,
    min: Option<f64>,
    max: Option<f64>,
    checks: Vec<StringCheck>,
}

impl Field {
    fn new(rule: Rule) -> Self {
        Self {
            rule,
            required: true,
            nullable: false,
            default: None,
            min_len: None,
            max_len: None,
            min: None,
            max: None,
            checks: Vec::new(),
        }
    }

    pub fn string() -> Self {
        Self::new(Rule::String)
    }

    pub fn email() -> Self {
        Self::new(Rule::Email)
    }

    /// A UUID, normalized to lowercase hyphenated form.
    pub fn uuid() -> Self {
        Self::new(Rule::Uuid)
    }

    pub fn one_of(values: &[&str]) -> Self {
        Self::new(Rule::Enum(values.iter().map(|v| v.to_string()).collect()))
    }

    /// Accepts JSON integers, and integer strings in params and query input.
    pub fn integer() -> Self {
        Self::new(Rule::Integer)
    }

    pub fn number() -> Self {
        Self::new(Rule::Number)
    }

    pub fn boolean() -> Self {
        Self::new(Rule::Boolean)
    }

    /// A calendar date in `YYYY-MM-DD` form.
    pub fn date() -> Self {
        Self::new(Rule::Date)
    }

    /// An RFC 3339 timestamp, normalized to UTC.
    pub fn datetime() -> Self {
        Self::new(Rule::DateTime)
    }

    pub fn array(items: Field) -> Self {
        Self::new(Rule::Array(Box::new(items)))
    }

    pub fn object(schema: Schema) -> Self {
        Self::new(Rule::Object(schema))
    }

    pub fn any() -> Self {
        Self::new(Rule::Any)
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Value used when the key is absent. Implies `optional()`.
    #[must_use]
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.required = false;
        self.default = Some(value.into());
        self
    }

    /// Minimum length: characters for strings, items for arrays.
    #[must_use]
    pub fn min_len(mut self, n: usize) -> Self {
        self.min_len = Some(n);
        self
    }

    /// Maximum length: characters for strings, items for arrays.
    #[must_use]
    pub fn max_len(mut self, n: usize) -> Self {
        self.max_len = Some(n);
        self
    }

    /// Lower bound for integers and numbers.
    #[must_use]
    pub fn min(mut self, n: impl Into<f64>) -> Self {
        self.min = Some(n.into());
        self
    }

    /// Upper bound for integers and numbers.
    #[must_use]
    pub fn max(mut self, n: impl Into<f64>) -> Self {
        self.max = Some(n.into());
        self
    }

    /// Adds a custom check on the normalized string. Only fields that
    /// normalize to a string (string, email, uuid, enum, date, datetime)
    /// accept checks.
    #[must_use]
    pub fn check(mut self, check: StringCheck) -> Self {
        debug_assert!(
            self.rule.yields_string(),
            "custom string checks need a string-valued field"
        );
        self.checks.push(check);
        self
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Validates one (possibly absent) value. `None` in the result means the
    /// key stays absent from the normalized output.
    fn validate(
        &self,
        value: Option<&Value>,
        path: &str,
        from_text: bool,
        errors: &mut Vec<FieldError>,
    ) -> Option<Value> {
        match value {
            None => {
                if let Some(default) = &self.default {
                    Some(default.clone())
                } else {
                    if self.required {
                        errors.push(FieldError::new(path, "is required"));
                    }
                    None
                }
            }
            Some(Value::Null) if self.nullable => Some(Value::Null),
            Some(Value::Null) => {
                errors.push(FieldError::new(path, "must not be null"));
                None
            }
            Some(value) => self.apply(value, path, from_text, errors),
        }
    }

    fn apply(&self, value: &Value, path: &str, from_text: bool, errors: &mut Vec<FieldError>) -> Option<Value> {
        let before = errors.len();
        let mut fail = |message: String| errors.push(FieldError::new(path, message));

        let normalized = match &self.rule {
            Rule::String => {
                let Some(s) = value.as_str() else {
                    fail("must be a string".to_string());
                    return None;
                };
                let count = s.chars().count();
                if let Some(min) = self.min_len.filter(|min| count < *min) {
                    fail(format!("must be at least {}", characters(min)));
                }
                if let Some(max) = self.max_len.filter(|max| count > *max) {
                    fail(format!("must be at most {}", characters(max)));
                }
                Value::String(s.to_string())
            }
            Rule::Email => match value.as_str() {
                Some(s) if s.validate_email() => Value::String(s.to_string()),
                _ => {
                    fail("must be a valid email address".to_string());
                    return None;
                }
            },
            Rule::Uuid => match value.as_str().and_then(|s| uuid::Uuid::parse_str(s.trim()).ok()) {
                Some(id) => Value::String(id.to_string()),
                None => {
                    fail("must be a valid UUID".to_string());
                    return None;
                }
            },
            Rule::Enum(allowed) => match value.as_str() {
                Some(s) if allowed.iter().any(|a| a == s) => Value::String(s.to_string()),
                _ => {
                    fail(format!("must be one of: {}", allowed.join(", ")));
                    return None;
                }
            },
            Rule::Integer => {
                let Some(n) = as_integer(value, from_text) else {
                    fail("must be an integer".to_string());
                    return None;
                };
                self.check_bounds(n as f64, &mut fail);
                Value::from(n)
            }
            Rule::Number => {
                let parsed = match value {
                    Value::Number(n) => Some(Value::Number(n.clone())),
                    Value::String(s) if from_text => number_from_str(s.trim()),
                    _ => None,
                };
                let Some(n) = parsed else {
                    fail("must be a number".to_string());
                    return None;
                };
                if let Some(f) = n.as_f64() {
                    self.check_bounds(f, &mut fail);
                }
                n
            }
            Rule::Boolean => {
                let parsed = match value {
                    Value::Bool(b) => Some(*b),
                    Value::String(s) if from_text => match s.as_str() {
                        "true" | "1" => Some(true),
                        "false" | "0" => Some(false),
                        _ => None,
                    },
                    _ => None,
                };
                let Some(b) = parsed else {
                    fail("must be a boolean".to_string());
                    return None;
                };
                Value::Bool(b)
            }
            Rule::Date => match value
                .as_str()
                .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
            {
                Some(date) => Value::String(date.format("%Y-%m-%d").to_string()),
                None => {
                    fail("must be a date in YYYY-MM-DD format".to_string());
                    return None;
                }
            },
            Rule::DateTime => match value
                .as_str()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            {
                Some(at) => Value::String(
                    at.with_timezone(&Utc)
                        .to_rfc3339_opts(SecondsFormat::AutoSi, true),
                ),
                None => {
                    fail("must be an RFC 3339 date-time".to_string());
                    return None;
                }
            },
            Rule::Array(items) => {
                let elements: Vec<Value> = match value {
                    Value::Array(elements) => elements.clone(),
                    Value::String(_) | Value::Number(_) | Value::Bool(_) if from_text => vec![value.clone()],
                    _ => {
                        fail("must be an array".to_string());
                        return None;
                    }
                };
                if let Some(min) = self.min_len.filter(|min| elements.len() < *min) {
                    fail(format!("must contain at least {}", plural(min, "item")));
                }
                if let Some(max) = self.max_len.filter(|max| elements.len() > *max) {
                    fail(format!("must contain at most {}", plural(max, "item")));
                }
                let normalized: Vec<Value> = elements
                    .iter()
                    .enumerate()
                    .filter_map(|(i, element)| {
                        items.validate(Some(element), &format!("{path}[{i}]"), from_text, errors)
                    })
                    .collect();
                Value::Array(normalized)
            }
            Rule::Object(schema) => {
                let Some(map) = value.as_object() else {
                    fail("must be an object".to_string());
                    return None;
                };
                Value::Object(schema.validate_map(map, path, from_text, errors))
            }
            Rule::Any => value.clone(),
        };

        if let Value::String(s) = &normalized {
            for check in &self.checks {
                if let Err(e) = check(s) {
                    errors.push(FieldError::new(path, describe(&e)));
                }
            }
        }

        (errors.len() == before).then_some(normalized)
    }

    /// A well-typed stand-in value, used where the real one failed.
    pub(crate) fn placeholder(&self) -> Value {
        if let Some(default) = &self.default {
            return default.clone();
        }
        if self.nullable {
            return Value::Null;
        }
        match &self.rule {
            Rule::String | Rule::Email => Value::String(String::new()),
            Rule::Uuid => Value::String(uuid::Uuid::nil().to_string()),
            Rule::Enum(allowed) => Value::String(allowed.first().cloned().unwrap_or_default()),
            Rule::Integer | Rule::Number => Value::from(0),
            Rule::Boolean => Value::Bool(false),
            Rule::Date => Value::String("1970-01-01".to_string()),
            Rule::DateTime => Value::String("1970-01-01T00:00:00Z".to_string()),
            Rule::Array(_) => Value::Array(Vec::new()),
            Rule::Object(schema) => Value::Object(schema.placeholder()),
            Rule::Any => Value::Null,
        }
    }

    fn check_bounds(&self, n: f64, fail: &mut impl FnMut(String)) {
        if let Some(min) = self.min.filter(|min| n < *min) {
            fail(format!("must be at least {min}"));
        }
        if let Some(max) = self.max.filter(|max| n > *max) {
            fail(format!("must be at most {max}"));
        }
    }
}

impl Rule {
    fn yields_string(&self) -> bool {
        matches!(
            self,
            Self::String | Self::Email | Self::Uuid | Self::Enum(_) | Self::Date | Self::DateTime
        )
    }
}

/// Whole floats (`3.0`) count as integers only inside the `i64` range.
fn as_integer(value: &Value, from_text: bool) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) if from_text => s.trim().parse().ok(),
        _ => None,
    }
}

fn number_from_str(s: &str) -> Option<Value> {
    if let Ok(n) = s.parse::<i64>() {
        return Some(Value::from(n));
    }
    s.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
}

fn plural(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("1 {noun}")
    } else {
        format!("{n} {noun}s")
    }
}

/// An object schema: an ordered list of named fields.
///
/// # Example
///
/// ```rust
/// use ledgergate::validation::{Field, InputSchema, Schema};
/// use serde_json::json;
///
/// let schema = Schema::object()
///     .field("name", Field::string().min_len(1).max_len(100))
///     .field("currency", Field::string().default("USD"));
///
/// let normalized = schema.validate(json!({"name": "Checking"})).unwrap();
/// assert_eq!(normalized, json!({"name": "Checking", "currency": "USD"}));
/// ```
#[derive(Clone, Default)]
pub struct Schema {
    fields: Vec<(String, Field)>,
}

impl Schema {
    pub fn object() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn field(mut self, name: impl Into<String>, field: Field) -> Self {
        self.fields.push((name.into(), field));
        self
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub(crate) fn get(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, field)| field)
    }

    /// A stand-in object with a placeholder for every field.
    pub(crate) fn placeholder(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .map(|(name, field)| (name.clone(), field.placeholder()))
            .collect()
    }

    fn validate_map(
        &self,
        map: &Map<String, Value>,
        prefix: &str,
        from_text: bool,
        errors: &mut Vec<FieldError>,
    ) -> Map<String, Value> {
        let mut out = Map::new();
        for (name, field) in &self.fields {
            let path = join_path(prefix, name);
            if let Some(value) = field.validate(map.get(name), &path, from_text, errors) {
                out.insert(name.clone(), value);
            }
        }
        out
    }

    /// Validates `raw` and returns the normalized fields that passed along
    /// with every violation. Failed fields are left out of the map.
    pub(crate) fn partial(
        &self,
        source: InputSource,
        raw: &Value,
    ) -> Result<(Map<String, Value>, Vec<FieldError>), FieldError> {
        let Value::Object(map) = raw else {
            return Err(FieldError::new("", "must be a JSON object"));
        };
        let mut errors = Vec::new();
        let normalized = self.validate_map(map, "", source != InputSource::Body, &mut errors);
        Ok((normalized, errors))
    }
}

impl InputSchema for Schema {
    fn validate(&self, raw: Value) -> Result<Value, Vec<FieldError>> {
        self.validate_from(InputSource::Body, raw)
    }

    fn validate_from(&self, source: InputSource, raw: Value) -> Result<Value, Vec<FieldError>> {
        let (normalized, errors) = self.partial(source, &raw).map_err(|e| vec![e])?;
        if errors.is_empty() {
            Ok(Value::Object(normalized))
        } else {
            Err(errors)
        }
    }
}

impl std::fmt::Debug for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.field_names()).finish()
    }
}
