//! Credential verification.
//!
//! The pipeline only sees `Arc<dyn CredentialVerifier>`; which strategy
//! backs it (signed tokens, stored sessions) is a deployment decision.

mod identity;
pub mod jwt;
pub mod session;
mod token;
mod verifier;

pub use identity::Identity;
pub use jwt::{IdentityClaims, JwtVerifier};
pub use session::{InMemorySessionStore, SessionRecord, SessionStore, SessionVerifier};
pub use token::TokenExtractor;
pub use verifier::CredentialVerifier;
