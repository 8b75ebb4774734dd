//! Root configuration type.

use reqparams_telemetry::{create_env_filter, LogFormat};
use serde::{Deserialize, Serialize};

use crate::{ConfigError, LoggingSection, ParametersSection};

/// Complete reqparams configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use reqparams_config::ParametersConfig;
///
/// let config = ParametersConfig::default();
/// assert_eq!(config.parameters.name, "parameters");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct ParametersConfig {
    /// Option defaults for every handler.
    #[serde(default)]
    pub parameters: ParametersSection,

    /// Logging setup.
    #[serde(default)]
    pub logging: LoggingSection,
}

impl ParametersConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if:
    /// - `parameters.raw_name` or `parameters.name` is empty
    /// - `parameters.max_errors_per_field` is zero
    /// - `logging.level` is not a valid filter directive
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.parameters.raw_name.is_empty() {
            return Err(ConfigError::invalid_value("parameters.raw_name", "must not be empty"));
        }
        if self.parameters.name.is_empty() {
            return Err(ConfigError::invalid_value("parameters.name", "must not be empty"));
        }
        if self.parameters.max_errors_per_field == 0 {
            return Err(ConfigError::invalid_value(
                "parameters.max_errors_per_field",
                "must be at least 1",
            ));
        }
        if self.logging.enabled {
            create_env_filter(&self.logging.level)
                .map_err(|e| ConfigError::invalid_value("logging.level", e.to_string()))?;
        }
        Ok(())
    }

    /// Development preset: pretty debug logs with source locations.
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.include_location = true;
        config
    }

    /// Production preset: JSON logs at info.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(ParametersConfig::default().validate().is_ok());
    }

    #[test]
    fn test_empty_names_rejected() {
        let mut config = ParametersConfig::default();
        config.parameters.raw_name = String::new();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "parameters.raw_name"
        ));

        let mut config = ParametersConfig::default();
        config.parameters.name = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_error_cap_rejected() {
        let mut config = ParametersConfig::default();
        config.parameters.max_errors_per_field = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_log_level_rejected_only_when_enabled() {
        let mut config = ParametersConfig::default();
        config.logging.level = "reqparams=loud".to_string();
        assert!(config.validate().is_err());

        config.logging.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets() {
        assert_eq!(ParametersConfig::development().logging.format, LogFormat::Pretty);
        assert_eq!(ParametersConfig::production().logging.format, LogFormat::Json);
    }
}
