use super::stage::PipelineState;
use crate::auth::Identity;
use crate::error::{GateError, Result};
use crate::organizations::Membership;
use crate::validation::{FieldError, InputSource};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;
use uuid::Uuid;

/// The request body as received, before any validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RawBody {
    #[default]
    Empty,
    Json(Value),
    /// Present but unusable; the message says why.
    Invalid(String),
}

impl RawBody {
    /// Classifies raw bytes: blank is empty, otherwise they must be JSON.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Self::Empty;
        }
        match serde_json::from_slice(bytes) {
            Ok(value) => Self::Json(value),
            Err(e) => Self::Invalid(format!("invalid JSON: {e}")),
        }
    }
}

/// Transport-independent view of an incoming request.
#[derive(Debug, Clone, Default)]
pub struct RawRequest {
    pub authorization: Option<String>,
    pub path_params: HashMap<String, String>,
    pub query: Option<String>,
    pub body: RawBody,
}

impl RawRequest {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn authorization(mut self, value: impl Into<String>) -> Self {
        self.authorization = Some(value.into());
        self
    }

    #[must_use]
    pub fn bearer(self, token: &str) -> Self {
        self.authorization(format!("Bearer {token}"))
    }

    #[must_use]
    pub fn path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = RawBody::Json(body);
        self
    }

    #[must_use]
    pub fn body(mut self, body: RawBody) -> Self {
        self.body = body;
        self
    }
}

/// Parses a query string into a JSON object. Repeated keys become arrays.
///
/// Escapes that do not decode to UTF-8 are rejected rather than replaced.
pub(crate) fn query_to_value(query: Option<&str>) -> std::result::Result<Value, FieldError> {
    let pairs: Vec<(String, String)> = match query {
        Some(q) => {
            check_escapes(q)?;
            serde_urlencoded::from_str(q)
                .map_err(|e| FieldError::new("", format!("invalid query string: {e}")))?
        }
        None => Vec::new(),
    };

    let mut map = Map::new();
    for (key, value) in pairs {
        match map.get_mut(&key) {
            Some(Value::Array(values)) => values.push(Value::String(value)),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(value)]);
            }
            None => {
                map.insert(key, Value::String(value));
            }
        }
    }
    Ok(Value::Object(map))
}

fn check_escapes(query: &str) -> std::result::Result<(), FieldError> {
    for pair in query.split('&') {
        let bytes = pair.as_bytes();
        let mut decoded = Vec::with_capacity(bytes.len());
        let mut i = 0;
        while i < bytes.len() {
            let escaped = bytes
                .get(i + 1..i + 3)
                .filter(|hex| bytes[i] == b'%' && hex.iter().all(u8::is_ascii_hexdigit))
                .and_then(|hex| std::str::from_utf8(hex).ok())
                .and_then(|hex| u8::from_str_radix(hex, 16).ok());
            match escaped {
                Some(byte) => {
                    decoded.push(byte);
                    i += 3;
                }
                None => {
                    decoded.push(bytes[i]);
                    i += 1;
                }
            }
        }
        if std::str::from_utf8(&decoded).is_err() {
            let key = pair.split('=').next().unwrap_or(pair);
            return Err(FieldError::new(key, "is not valid UTF-8 once percent-decoded"));
        }
    }
    Ok(())
}

/// What a handler receives once every stage has passed.
///
/// Populated only by the pipeline; handlers read it.
#[derive(Debug, Clone)]
pub struct RequestContext {
    route: String,
    pub(crate) state: PipelineState,
    pub(crate) identity: Option<Identity>,
    pub(crate) membership: Option<Membership>,
    pub(crate) org_id: Option<Uuid>,
    pub(crate) params: Value,
    pub(crate) query: Value,
    pub(crate) body: Value,
}

impl RequestContext {
    pub(crate) fn new(route: &str) -> Self {
        Self {
            route: route.to_string(),
            state: PipelineState::Start,
            identity: None,
            membership: None,
            org_id: None,
            params: Value::Null,
            query: Value::Null,
            body: Value::Null,
        }
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// The verified caller; `None` on public routes.
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// The caller's membership; `None` on routes without an organization scope.
    pub fn membership(&self) -> Option<&Membership> {
        self.membership.as_ref()
    }

    pub fn org_id(&self) -> Option<Uuid> {
        self.org_id
    }

    pub fn params(&self) -> &Value {
        &self.params
    }

    pub fn query(&self) -> &Value {
        &self.query
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    /// The caller, for handlers mounted on authenticated routes.
    pub fn require_identity(&self) -> Result<&Identity> {
        self.identity
            .as_ref()
            .ok_or_else(|| GateError::internal(format!("route {} has no identity", self.route)))
    }

    /// The membership, for handlers mounted on organization-scoped routes.
    pub fn require_membership(&self) -> Result<&Membership> {
        self.membership
            .as_ref()
            .ok_or_else(|| GateError::internal(format!("route {} has no membership", self.route)))
    }

    pub fn params_as<T: DeserializeOwned>(&self) -> Result<T> {
        decode(&self.params, InputSource::Params)
    }

    pub fn query_as<T: DeserializeOwned>(&self) -> Result<T> {
        decode(&self.query, InputSource::Query)
    }

    pub fn body_as<T: DeserializeOwned>(&self) -> Result<T> {
        decode(&self.body, InputSource::Body)
    }
}

fn decode<T: DeserializeOwned>(value: &Value, input: InputSource) -> Result<T> {
    T::deserialize(value).map_err(|e| GateError::validation(input, vec![FieldError::new("", e.to_string())]))
}
