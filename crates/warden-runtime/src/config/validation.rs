//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{LogOutput, LoggingConfig, WardenConfig};

/// Validates the entire configuration.
///
/// `webconsole.auth_type` is not checked; an unknown value falls back to the
/// default preference at startup.
pub fn validate_config(config: &WardenConfig) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;
    Ok(())
}

/// Validates logging configuration.
fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    for target in logging.filters.keys() {
        if target.is_empty() {
            return Err(ConfigError::validation("Log filter target cannot be empty"));
        }
        if target.chars().any(char::is_whitespace) {
            return Err(ConfigError::validation(format!(
                "Log filter target cannot contain whitespace: '{target}'"
            )));
        }
    }

    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }

    Ok(())
}
