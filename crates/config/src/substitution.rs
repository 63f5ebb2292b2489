use anyhow::Result;
use regex::Regex;
use std::env;
use tracing::{debug, warn};

/// Substitute environment variables in the format ${VAR_NAME} or $VAR_NAME
pub fn substitute_env_vars(content: &str) -> Result<String> {
    let re = Regex::new(r"\$\{(\w+)\}|\$(\w+)").expect("static regex");
    let mut result = content.to_string();
    let mut missing_vars = Vec::new();

    for caps in re.captures_iter(content) {
        let var_name = match caps.get(1).or_else(|| caps.get(2)) {
            Some(m) => m.as_str(),
            None => continue,
        };
        let placeholder = match caps.get(0) {
            Some(m) => m.as_str(),
            None => continue,
        };

        match env::var(var_name) {
            Ok(value) => {
                debug!("Substituting environment variable: {}", var_name);
                result = result.replace(placeholder, &value);
            }
            Err(_) => {
                warn!("Environment variable '{}' not set", var_name);
                missing_vars.push(var_name.to_string());
                // Keep the placeholder if env var is not set
                // The validator will catch this later
            }
        }
    }

    if !missing_vars.is_empty() {
        debug!(
            "Environment variables not set (may use defaults or fail validation): {:?}",
            missing_vars
        );
    }

    Ok(result)
}

/// Check if a string contains unresolved environment variable placeholders
pub fn has_unresolved_env_vars(content: &str) -> bool {
    let re = Regex::new(r"\$\{(\w+)\}|\$(\w+)").expect("static regex");
    re.is_match(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitute_braced_var() {
        env::set_var("MARKETSYNC_TEST_KEY", "secret");
        let out = substitute_env_vars("api_key: ${MARKETSYNC_TEST_KEY}").unwrap();
        assert_eq!(out, "api_key: secret");
        env::remove_var("MARKETSYNC_TEST_KEY");
    }

    #[test]
    fn test_missing_var_keeps_placeholder() {
        env::remove_var("MARKETSYNC_TEST_MISSING");
        let out = substitute_env_vars("api_key: ${MARKETSYNC_TEST_MISSING}").unwrap();
        assert_eq!(out, "api_key: ${MARKETSYNC_TEST_MISSING}");
        assert!(has_unresolved_env_vars(&out));
    }

    #[test]
    fn test_no_placeholders() {
        let out = substitute_env_vars("host: 0.0.0.0").unwrap();
        assert_eq!(out, "host: 0.0.0.0");
        assert!(!has_unresolved_env_vars(&out));
    }
}
