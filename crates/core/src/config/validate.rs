use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Card language is a known code or name
/// - Gateway timeout and retry base delay are non-zero
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.policy.language().is_none() {
        return Err(ConfigError::ValidationError(format!(
            "policy.card_lang '{}' is not a known language",
            config.policy.card_lang
        )));
    }

    if config.gateway.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "gateway.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.gateway.max_retries > 0 && config.gateway.retry_base_delay_ms == 0 {
        return Err(ConfigError::ValidationError(
            "gateway.retry_base_delay_ms cannot be 0 when retries are enabled".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_unknown_language_fails() {
        let mut config = Config::default();
        config.policy.card_lang = "elvish".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_zero_timeout_fails() {
        let mut config = Config::default();
        config.gateway.timeout_secs = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_retry_delay() {
        let mut config = Config::default();
        config.gateway.retry_base_delay_ms = 0;
        assert!(validate_config(&config).is_err());

        config.gateway.max_retries = 0;
        assert!(validate_config(&config).is_ok());
    }
}
