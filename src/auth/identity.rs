use serde::Serialize;

/// The verified caller of one request.
///
/// Produced only by a [`CredentialVerifier`](super::CredentialVerifier) and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    id: String,
    email: String,
}

impl Identity {
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_serializes_both_fields() {
        let identity = Identity::new("user-1", "ada@example.com");
        let json = serde_json::to_value(&identity).unwrap();
        assert_eq!(json, serde_json::json!({"id": "user-1", "email": "ada@example.com"}));
    }
}
