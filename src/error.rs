use crate::validation::{FieldError, InputSource, field_errors_from};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a credential was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthenticationReason {
    MissingCredential,
    MalformedCredential,
    ExpiredCredential,
    InvalidCredential,
}

impl AuthenticationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingCredential => "missing_credential",
            Self::MalformedCredential => "malformed_credential",
            Self::ExpiredCredential => "expired_credential",
            Self::InvalidCredential => "invalid_credential",
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Self::MissingCredential => "no credential was presented",
            Self::MalformedCredential => "the credential is malformed",
            Self::ExpiredCredential => "the credential has expired",
            Self::InvalidCredential => "the credential is invalid",
        }
    }
}

impl fmt::Display for AuthenticationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Why an authenticated caller was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationReason {
    NotAMember,
    InsufficientRole,
}

impl AuthorizationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotAMember => "not_a_member",
            Self::InsufficientRole => "insufficient_role",
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Self::NotAMember => "not a member of this organization",
            Self::InsufficientRole => "your role does not permit this action",
        }
    }
}

impl fmt::Display for AuthorizationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Every way a request can fail before or inside a handler.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("Validation failed for {input}: {}", summarize(.errors))]
    Validation {
        input: InputSource,
        errors: Vec<FieldError>,
    },

    #[error("Authentication failed: {0}")]
    Authentication(AuthenticationReason),

    #[error("Access denied: {0}")]
    Authorization(AuthorizationReason),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// JSON body of every failed request.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub kind: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<InputSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<Vec<FieldError>>,
    pub error_id: String,
}

impl GateError {
    /// Builds a validation failure. Errors addressed to the input as a whole
    /// are attributed to the input source itself.
    pub fn validation(input: InputSource, errors: Vec<FieldError>) -> Self {
        let errors = errors
            .into_iter()
            .map(|mut e| {
                if e.is_root() {
                    e.field = input.as_str().to_string();
                }
                e
            })
            .collect();
        Self::Validation { input, errors }
    }

    pub fn authentication(reason: AuthenticationReason) -> Self {
        Self::Authentication(reason)
    }

    pub fn authorization(reason: AuthorizationReason) -> Self {
        Self::Authorization(reason)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Stable machine-readable category, also used as the `kind` field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation_error",
            Self::Authentication(_) => "authentication_error",
            Self::Authorization(_) => "authorization_error",
            Self::NotFound(_) => "not_found",
            Self::Internal(_) | Self::Anyhow(_) => "internal_error",
        }
    }

    pub fn reason(&self) -> Option<&'static str> {
        match self {
            Self::Authentication(reason) => Some(reason.as_str()),
            Self::Authorization(reason) => Some(reason.as_str()),
            _ => None,
        }
    }

    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            Self::Validation { errors, .. } => errors,
            _ => &[],
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Authentication(_) => StatusCode::UNAUTHORIZED,
            Self::Authorization(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) | Self::Anyhow(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message suitable for clients: server-side failures never leak their
    /// details.
    fn safe_message(&self) -> String {
        match self {
            Self::Internal(_) | Self::Anyhow(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }

    /// Convert to a response.
    ///
    /// # Security
    ///
    /// Internal error details are only exposed when `dev_mode` is `true`.
    pub fn into_response_with(self, dev_mode: bool) -> Response {
        let status = self.status_code();
        let error_id = uuid::Uuid::new_v4().to_string();

        if status.is_server_error() {
            tracing::error!(
                status = status.as_u16(),
                error_id = %error_id,
                error = %self,
                "Request failed"
            );
        } else {
            tracing::warn!(
                status = status.as_u16(),
                error_id = %error_id,
                kind = self.kind(),
                reason = self.reason().unwrap_or("-"),
                "Request rejected"
            );
        }

        let message = if dev_mode {
            self.to_string()
        } else {
            self.safe_message()
        };
        let kind = self.kind().to_string();
        let reason = self.reason().map(str::to_string);

        let (source, field_errors) = match self {
            Self::Validation { input, errors } => (Some(input), Some(errors)),
            _ => (None, None),
        };

        let body = ErrorResponse {
            kind,
            message,
            reason,
            source,
            field_errors,
            error_id,
        };

        (status, Json(body)).into_response()
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        self.into_response_with(false)
    }
}

/// Result type alias used throughout the crate and by handlers.
pub type Result<T> = std::result::Result<T, GateError>;

impl From<serde_json::Error> for GateError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            GateError::validation(
                InputSource::Body,
                vec![FieldError::new("", format!("invalid JSON: {err}"))],
            )
        } else {
            GateError::Internal(format!("JSON serialization error: {err}"))
        }
    }
}

impl From<validator::ValidationErrors> for GateError {
    fn from(err: validator::ValidationErrors) -> Self {
        GateError::validation(InputSource::Body, field_errors_from(&err))
    }
}
