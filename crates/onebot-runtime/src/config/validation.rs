//! Configuration validation.

use super::error::{ConfigError, ConfigResult};
use super::schema::{CorrelationConfig, RuntimeConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &RuntimeConfig) -> ConfigResult<()> {
    validate_correlation(&config.correlation)?;
    validate_filters(config)?;
    Ok(())
}

fn validate_correlation(correlation: &CorrelationConfig) -> ConfigResult<()> {
    if correlation.timeout_ms == 0 {
        return Err(ConfigError::validation(
            "correlation.timeout_ms must be greater than 0",
        ));
    }
    if correlation.max_pending == 0 {
        return Err(ConfigError::validation(
            "correlation.max_pending must be greater than 0",
        ));
    }
    Ok(())
}

fn validate_filters(config: &RuntimeConfig) -> ConfigResult<()> {
    for target in config.logging.filters.keys() {
        if target.is_empty() || target.contains(char::is_whitespace) || target.contains('=') {
            return Err(ConfigError::validation(format!(
                "Invalid log filter target: {target:?}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_config(&RuntimeConfig::default()).is_ok());
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let mut config = RuntimeConfig::default();
        config.correlation.timeout_ms = 0;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_bad_filter_target_is_rejected() {
        let mut config = RuntimeConfig::default();
        config
            .logging
            .filters
            .insert("onebot codec".to_string(), LogLevel::Debug);
        assert!(validate_config(&config).is_err());
    }
}
