use crate::error::{AuthenticationReason, GateError, Result};

/// Extracts the bearer token from a raw `Authorization` header value.
pub struct TokenExtractor;

impl TokenExtractor {
    /// `None` is a missing credential; anything that is not
    /// `Bearer <token>` is a malformed one. The scheme is case-insensitive.
    pub fn bearer(header: Option<&str>) -> Result<String> {
        let header = header.ok_or(GateError::Authentication(AuthenticationReason::MissingCredential))?;
        let malformed = || GateError::Authentication(AuthenticationReason::MalformedCredential);

        let (scheme, token) = header.trim().split_once(' ').ok_or_else(malformed)?;
        if !scheme.eq_ignore_ascii_case("bearer") {
            return Err(malformed());
        }

        let token = token.trim();
        if token.is_empty() || token.contains(char::is_whitespace) {
            return Err(malformed());
        }

        Ok(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(result: Result<String>) -> AuthenticationReason {
        match result {
            Err(GateError::Authentication(reason)) => reason,
            other => panic!("expected authentication error, got {other:?}"),
        }
    }

    #[test]
    fn test_extract_from_valid_bearer_header() {
        assert_eq!(TokenExtractor::bearer(Some("Bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_scheme_is_case_insensitive() {
        assert_eq!(TokenExtractor::bearer(Some("bearer token123")).unwrap(), "token123");
    }

    #[test]
    fn test_missing_header() {
        assert_eq!(reason(TokenExtractor::bearer(None)), AuthenticationReason::MissingCredential);
    }

    #[test]
    fn test_wrong_scheme_is_malformed() {
        assert_eq!(
            reason(TokenExtractor::bearer(Some("Basic dXNlcjpwYXNz"))),
            AuthenticationReason::MalformedCredential
        );
    }

    #[test]
    fn test_empty_token_is_malformed() {
        assert_eq!(
            reason(TokenExtractor::bearer(Some("Bearer "))),
            AuthenticationReason::MalformedCredential
        );
        assert_eq!(
            reason(TokenExtractor::bearer(Some("Bearer"))),
            AuthenticationReason::MalformedCredential
        );
    }

    #[test]
    fn test_token_with_spaces_is_malformed() {
        assert_eq!(
            reason(TokenExtractor::bearer(Some("Bearer a b"))),
            AuthenticationReason::MalformedCredential
        );
    }
}
