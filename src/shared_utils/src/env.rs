use thiserror::Error;

/// An environment variable required by the application is not set.
#[derive(Debug, Error)]
#[error("Missing environment variable: {0}")]
pub struct MissingEnvVarError(pub String);

/// Reads an environment variable, returning a structured error if it's missing.
///
/// This is a thin wrapper around `std::env::var` that provides a more
/// ergonomic and specific error type for missing variables.
///
/// # Arguments
/// * `name` - The name of the environment variable to read.
pub fn get_env_var(name: &str) -> Result<String, MissingEnvVarError> {
    std::env::var(name).map_err(|_| MissingEnvVarError(name.to_string()))
}

/// Reads an optional override from the environment.
///
/// Unset, non-unicode, and blank values all count as "no override". The
/// returned value is trimmed.
pub fn env_override(name: &str) -> Option<String> {
    get_env_var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VAR: &str = "SHARED_UTILS_TEST_VAR";

    #[test]
    #[serial]
    fn missing_var_is_structured_error() {
        unsafe { std::env::remove_var(VAR) };
        let err = get_env_var(VAR).unwrap_err();
        assert_eq!(err.0, VAR);
        assert!(err.to_string().contains(VAR));
    }

    #[test]
    #[serial]
    fn override_trims_and_ignores_blank() {
        unsafe { std::env::set_var(VAR, "  https://example.test/codes  ") };
        assert_eq!(
            env_override(VAR).as_deref(),
            Some("https://example.test/codes")
        );

        unsafe { std::env::set_var(VAR, "   ") };
        assert_eq!(env_override(VAR), None);

        unsafe { std::env::remove_var(VAR) };
        assert_eq!(env_override(VAR), None);
    }
}
