/// Get an environment variable with the `LEDGERGATE_` prefix, falling back to
/// the unprefixed name.
///
/// # Examples
///
/// ```rust
/// use ledgergate::utils::get_env_with_prefix;
///
/// // Checks LEDGERGATE_PORT first, then PORT
/// let port = get_env_with_prefix("PORT");
/// ```
pub fn get_env_with_prefix(key: &str) -> Option<String> {
    std::env::var(format!("LEDGERGATE_{key}"))
        .or_else(|_| std::env::var(key))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_env_with_prefix() {
        unsafe {
            std::env::set_var("LEDGERGATE_GATE_TEST_VAR", "prefixed_value");
            std::env::set_var("GATE_TEST_VAR", "unprefixed_value");
        }
        assert_eq!(get_env_with_prefix("GATE_TEST_VAR"), Some("prefixed_value".to_string()));

        unsafe {
            std::env::remove_var("LEDGERGATE_GATE_TEST_VAR");
        }
        assert_eq!(get_env_with_prefix("GATE_TEST_VAR"), Some("unprefixed_value".to_string()));

        unsafe {
            std::env::remove_var("GATE_TEST_VAR");
        }
        assert_eq!(get_env_with_prefix("GATE_TEST_VAR"), None);
    }
}
