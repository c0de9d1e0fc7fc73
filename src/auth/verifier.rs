use crate::auth::Identity;
use crate::error::Result;
use async_trait::async_trait;

/// Turns a raw credential into an [`Identity`].
///
/// Implement this trait to plug in any credential strategy: self-contained
/// signed tokens ([`JwtVerifier`](super::JwtVerifier)), opaque session
/// tokens ([`SessionVerifier`](super::SessionVerifier)), or an external
/// identity provider.
///
/// Failures must be `GateError::Authentication` with the reason that
/// matches what went wrong; store outages may surface as internal errors.
///
/// # Example
///
/// ```rust,ignore
/// use ledgergate::auth::{CredentialVerifier, Identity};
///
/// struct StaticVerifier;
///
/// #[async_trait]
/// impl CredentialVerifier for StaticVerifier {
///     async fn verify(&self, credential: &str) -> Result<Identity> {
///         if credential == "let-me-in" {
///             Ok(Identity::new("user-1", "user@example.com"))
///         } else {
///             Err(GateError::authentication(AuthenticationReason::InvalidCredential))
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait CredentialVerifier: Send + Sync + 'static {
    async fn verify(&self, credential: &str) -> Result<Identity>;
}
