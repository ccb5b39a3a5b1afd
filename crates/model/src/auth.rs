use cp_domain::{Error, Result};

/// Resolve the bearer token for the configured model endpoint.
///
/// The configured deployment is a single local/self-hosted endpoint
/// (spec.md §4.A, SPEC_FULL §10.3 `ModelConfig`), not a pool of rotating
/// provider keys, so resolution is a single environment variable lookup
/// rather than the multi-key rotation a hosted multi-provider gateway
/// would need.
pub fn resolve_api_key(env_var: &str) -> Result<String> {
    std::env::var(env_var).map_err(|_| {
        Error::Config(format!(
            "environment variable '{env_var}' not set or empty"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_env_var_is_an_error() {
        let result = resolve_api_key("CP_MODEL_TEST_KEY_NOT_SET_12345");
        assert!(result.is_err());
    }

    #[test]
    fn present_env_var_resolves() {
        std::env::set_var("CP_MODEL_TEST_KEY_PRESENT", "secret-token");
        let result = resolve_api_key("CP_MODEL_TEST_KEY_PRESENT").unwrap();
        assert_eq!(result, "secret-token");
        std::env::remove_var("CP_MODEL_TEST_KEY_PRESENT");
    }
}
