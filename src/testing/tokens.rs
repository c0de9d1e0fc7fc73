//! Access tokens for tests.

use super::fixtures::TestUser;
use crate::auth::{IdentityClaims, JwtVerifier};
use jsonwebtoken::{EncodingKey, Header, encode};
use std::time::{SystemTime, UNIX_EPOCH};

/// Default HS256 secret for test apps. Long enough for [`ConfigBuilder::build`](crate::ConfigBuilder::build).
pub const TEST_SECRET: &str = "ledgergate-test-secret-0123456789abcdef";

/// Mints HS256 tokens matching a [`JwtVerifier`] built from the same secret.
#[derive(Clone)]
pub struct TestTokens {
    secret: Vec<u8>,
}

impl Default for TestTokens {
    fn default() -> Self {
        Self::new(TEST_SECRET)
    }
}

impl TestTokens {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    /// A verifier that accepts these tokens.
    pub fn verifier(&self) -> JwtVerifier {
        JwtVerifier::from_secret(&self.secret)
    }

    /// A token valid for an hour.
    pub fn for_user(&self, user: &TestUser) -> String {
        self.sign(&self.claims(user, 3600), &self.secret)
    }

    /// A token that expired an hour ago, well past any leeway.
    pub fn expired(&self, user: &TestUser) -> String {
        self.sign(&self.claims(user, -3600), &self.secret)
    }

    /// A well-formed token signed with a different secret.
    pub fn wrong_key(&self, user: &TestUser) -> String {
        self.sign(&self.claims(user, 3600), b"some-other-secret-that-nobody-trusts")
    }

    /// Claims for `user` expiring `ttl_seconds` from now (negative for the past).
    pub fn claims(&self, user: &TestUser, ttl_seconds: i64) -> IdentityClaims {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        IdentityClaims {
            sub: user.id.clone(),
            email: user.email.clone(),
            exp: now.saturating_add_signed(ttl_seconds),
            iat: Some(now),
            iss: None,
            aud: None,
        }
    }

    /// Signs arbitrary claims with this secret.
    pub fn sign_claims(&self, claims: &IdentityClaims) -> String {
        self.sign(claims, &self.secret)
    }

    fn sign(&self, claims: &IdentityClaims, secret: &[u8]) -> String {
        encode(&Header::default(), claims, &EncodingKey::from_secret(secret)).unwrap()
    }
}
