use crate::auth::{CredentialVerifier, Identity};
use crate::config::AuthConfig;
use crate::error::{AuthenticationReason, GateError, Result};
use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};

/// Claims carried by access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityClaims {
    pub sub: String,
    pub email: String,
    pub exp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

/// Verifies self-contained signed tokens (HS256 or RS256).
///
/// # Security Note
///
/// For production use, configure both issuer and audience validation
/// using [`set_issuer`](Self::set_issuer) and
/// [`set_audience`](Self::set_audience).
#[derive(Clone)]
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
    issuer_configured: bool,
    audience_configured: bool,
    /// Ensures the missing-checks warning is logged once per verifier.
    warning_logged: Arc<OnceLock<()>>,
}

impl JwtVerifier {
    fn with_key(decoding_key: DecodingKey, algorithm: Algorithm) -> Self {
        let mut validation = Validation::new(algorithm);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            decoding_key,
            validation,
            issuer_configured: false,
            audience_configured: false,
            warning_logged: Arc::new(OnceLock::new()),
        }
    }

    /// Create a verifier using a shared secret (HS256).
    pub fn from_secret(secret: &[u8]) -> Self {
        Self::with_key(DecodingKey::from_secret(secret), Algorithm::HS256)
    }

    /// Create a verifier using an RSA public key in PEM format (RS256).
    pub fn from_rsa_pem(pem: &[u8]) -> Result<Self> {
        let decoding_key = DecodingKey::from_rsa_pem(pem)
            .map_err(|e| GateError::internal(format!("Invalid RSA PEM: {e}")))?;
        Ok(Self::with_key(decoding_key, Algorithm::RS256))
    }

    /// Create an HS256 verifier from the `auth` section of the config.
    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        let secret = config
            .jwt_secret
            .as_deref()
            .ok_or_else(|| GateError::internal("JWT secret is not configured"))?;

        let mut verifier = Self::from_secret(secret.as_bytes());
        if let Some(issuer) = &config.issuer {
            verifier.set_issuer(issuer.clone());
        }
        if let Some(audience) = &config.audience {
            verifier.set_audience(audience.clone());
        }
        verifier.set_leeway(config.leeway_seconds);
        Ok(verifier)
    }

    pub fn set_issuer(&mut self, issuer: impl Into<String>) {
        self.validation.set_issuer(&[issuer.into()]);
        self.issuer_configured = true;
    }

    pub fn set_audience(&mut self, audience: impl Into<String>) {
        self.validation.set_audience(&[audience.into()]);
        self.audience_configured = true;
    }

    /// Clock skew tolerated on `exp` and `nbf`, in seconds.
    pub fn set_leeway(&mut self, seconds: u64) {
        self.validation.leeway = seconds;
    }

    fn warn_once_if_unchecked(&self) {
        if self.issuer_configured && self.audience_configured {
            return;
        }
        self.warning_logged.get_or_init(|| {
            tracing::warn!(
                issuer_checked = self.issuer_configured,
                audience_checked = self.audience_configured,
                "JWT verifier is missing issuer or audience validation"
            );
        });
    }

    /// Decodes and validates a token, returning its claims.
    pub fn decode_claims(&self, token: &str) -> Result<IdentityClaims> {
        self.warn_once_if_unchecked();

        decode::<IdentityClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                let reason = classify(e.kind());
                tracing::debug!(error = %e, reason = reason.as_str(), "Token rejected");
                GateError::Authentication(reason)
            })
    }
}

fn classify(kind: &ErrorKind) -> AuthenticationReason {
    match kind {
        ErrorKind::ExpiredSignature => AuthenticationReason::ExpiredCredential,
        ErrorKind::InvalidToken
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_)
        | ErrorKind::MissingRequiredClaim(_) => AuthenticationReason::MalformedCredential,
        _ => AuthenticationReason::InvalidCredential,
    }
}

#[async_trait]
impl CredentialVerifier for JwtVerifier {
    async fn verify(&self, credential: &str) -> Result<Identity> {
        let claims = self.decode_claims(credential)?;
        if claims.sub.trim().is_empty() {
            return Err(GateError::Authentication(AuthenticationReason::InvalidCredential));
        }
        Ok(Identity::new(claims.sub, claims.email))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};

    const SECRET: &[u8] = b"my_secret_key_for_testing_123456";

    fn claims(exp_offset: i64) -> IdentityClaims {
        IdentityClaims {
            sub: "user-1".to_string(),
            email: "ada@example.com".to_string(),
            exp: (chrono::Utc::now().timestamp() + exp_offset) as u64,
            iat: None,
            iss: None,
            aud: None,
        }
    }

    fn sign(claims: &IdentityClaims, algorithm: Algorithm, secret: &[u8]) -> String {
        encode(&Header::new(algorithm), claims, &EncodingKey::from_secret(secret)).unwrap()
    }

    fn reason(result: Result<Identity>) -> AuthenticationReason {
        match result {
            Err(GateError::Authentication(reason)) => reason,
            other => panic!("expected authentication error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_valid_token_yields_identity() {
        let verifier = JwtVerifier::from_secret(SECRET);
        let token = sign(&claims(3600), Algorithm::HS256, SECRET);

        let identity = verifier.verify(&token).await.unwrap();
        assert_eq!(identity.id(), "user-1");
        assert_eq!(identity.email(), "ada@example.com");
    }

    #[tokio::test]
    async fn test_expired_token() {
        let verifier = JwtVerifier::from_secret(SECRET);
        let token = sign(&claims(-3600), Algorithm::HS256, SECRET);
        assert_eq!(reason(verifier.verify(&token).await), AuthenticationReason::ExpiredCredential);
    }

    #[tokio::test]
    async fn test_leeway_accepts_recently_expired_token() {
        let mut verifier = JwtVerifier::from_secret(SECRET);
        verifier.set_leeway(120);
        let token = sign(&claims(-30), Algorithm::HS256, SECRET);
        assert!(verifier.verify(&token).await.is_ok());
    }

    #[tokio::test]
    async fn test_garbage_is_malformed() {
        let verifier = JwtVerifier::from_secret(SECRET);
        assert_eq!(
            reason(verifier.verify("not-a-jwt").await),
            AuthenticationReason::MalformedCredential
        );
    }

    #[tokio::test]
    async fn test_wrong_key_is_invalid() {
        let verifier = JwtVerifier::from_secret(SECRET);
        let token = sign(&claims(3600), Algorithm::HS256, b"another_secret_key_entirely_9999");
        assert_eq!(reason(verifier.verify(&token).await), AuthenticationReason::InvalidCredential);
    }

    #[tokio::test]
    async fn test_algorithm_confusion_rejected() {
        let verifier = JwtVerifier::from_secret(SECRET);
        let token = sign(&claims(3600), Algorithm::HS384, SECRET);
        assert_eq!(reason(verifier.verify(&token).await), AuthenticationReason::InvalidCredential);
    }

    #[tokio::test]
    async fn test_none_algorithm_rejected() {
        let verifier = JwtVerifier::from_secret(SECRET);

        // {"alg":"none","typ":"JWT"} . {"sub":"user123","exp":9999999999}
        let none_token = "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.eyJzdWIiOiJ1c2VyMTIzIiwiZXhwIjo5OTk5OTk5OTk5fQ.";
        assert!(verifier.verify(none_token).await.is_err());
    }

    #[tokio::test]
    async fn test_issuer_and_audience_checked() {
        let mut verifier = JwtVerifier::from_secret(SECRET);
        verifier.set_issuer("ledgergate");
        verifier.set_audience("finance-api");

        let mut good = claims(3600);
        good.iss = Some("ledgergate".to_string());
        good.aud = Some("finance-api".to_string());
        assert!(verifier.verify(&sign(&good, Algorithm::HS256, SECRET)).await.is_ok());

        let mut foreign = good.clone();
        foreign.iss = Some("someone-else".to_string());
        assert_eq!(
            reason(verifier.verify(&sign(&foreign, Algorithm::HS256, SECRET)).await),
            AuthenticationReason::InvalidCredential
        );
    }

    #[tokio::test]
    async fn test_from_config_requires_secret() {
        let config = AuthConfig::default();
        assert!(matches!(JwtVerifier::from_config(&config), Err(GateError::Internal(_))));
    }
}
