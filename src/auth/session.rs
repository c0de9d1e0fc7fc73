//! Opaque session tokens checked against a store.

use crate::auth::{CredentialVerifier, Identity};
use crate::error::{AuthenticationReason, GateError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::RwLock;

/// Longest token accepted before the store is consulted.
const MAX_TOKEN_LEN: usize = 512;

/// A stored session: who it belongs to and when it stops being valid.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub identity: Identity,
    pub expires_at: SystemTime,
}

impl SessionRecord {
    pub fn new(identity: Identity, ttl: Duration) -> Self {
        Self {
            identity,
            expires_at: SystemTime::now() + ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        SystemTime::now() > self.expires_at
    }
}

/// Lookup of session tokens.
///
/// Expired records are returned as-is so the verifier can tell an expired
/// session from an unknown one.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    async fn find_session(&self, token: &str) -> Result<Option<SessionRecord>>;
}

/// In-memory session store for development and tests.
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, SessionRecord>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, token: impl Into<String>, record: SessionRecord) {
        self.sessions.write().await.insert(token.into(), record);
    }

    pub async fn revoke(&self, token: &str) {
        self.sessions.write().await.remove(token);
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn find_session(&self, token: &str) -> Result<Option<SessionRecord>> {
        Ok(self.sessions.read().await.get(token).cloned())
    }
}

/// Verifies opaque session tokens against a [`SessionStore`].
pub struct SessionVerifier<S> {
    store: S,
}

impl<S: SessionStore> SessionVerifier<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: SessionStore> CredentialVerifier for SessionVerifier<S> {
    async fn verify(&self, credential: &str) -> Result<Identity> {
        let well_formed = !credential.is_empty()
            && credential.len() <= MAX_TOKEN_LEN
            && credential.chars().all(|c| c.is_ascii_graphic());
        if !well_formed {
            return Err(GateError::Authentication(AuthenticationReason::MalformedCredential));
        }

        let record = self
            .store
            .find_session(credential)
            .await?
            .ok_or(GateError::Authentication(AuthenticationReason::InvalidCredential))?;

        if record.is_expired() {
            return Err(GateError::Authentication(AuthenticationReason::ExpiredCredential));
        }

        Ok(record.identity)
    }
}
