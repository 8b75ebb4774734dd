//! Layered configuration loading.

use std::env;
use std::fs;
use std::path::Path;

use reqparams_telemetry::LogFormat;

use crate::{ConfigError, ParametersConfig};

/// Configuration loader.
///
/// Layers apply in order, later ones winning:
/// 1. Built-in defaults
/// 2. A configuration file or string (TOML or JSON); keys it omits take
///    their defaults
/// 3. Environment variables `PREFIX__SECTION__KEY`
///
/// # Example
///
/// ```no_run
/// use reqparams_config::ConfigLoader;
///
/// # fn main() -> Result<(), reqparams_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_file("reqparams.toml")?
///     .with_env_prefix("REQPARAMS")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: ParametersConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: ParametersConfig::default(),
            env_prefix: None,
        }
    }

    /// Start with default configuration values.
    ///
    /// `new()` already does this; chain it for clarity.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = ParametersConfig::default();
        self
    }

    /// Start with the development preset.
    ///
    /// ```
    /// use reqparams_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().with_development().load().unwrap();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = ParametersConfig::development();
        self
    }

    /// Start with the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = ParametersConfig::production();
        self
    }

    /// Load configuration from a file.
    ///
    /// The format is taken from the extension (`.toml` or `.json`).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file does not exist or cannot be read,
    /// has an unsupported extension, or does not parse (unknown keys
    /// included).
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);
        self.config = match extension.as_deref() {
            Some(format @ ("toml" | "json")) => parse(&content, format)?,
            _ => return Err(ConfigError::unsupported_format(path.display().to_string())),
        };

        Ok(self)
    }

    /// Load configuration from a file if it exists.
    ///
    /// # Errors
    ///
    /// Same as [`with_file`](Self::with_file) when the file exists.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string.
    ///
    /// `format` is `"toml"` or `"json"`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the format is unknown or parsing fails.
    ///
    /// # Example
    ///
    /// ```
    /// use reqparams_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [parameters]
    ///     name = "input"
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.parameters.name, "input");
    /// assert_eq!(config.parameters.raw_name, "rawParameters");
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = parse(content, &format.to_lowercase())?;
        Ok(self)
    }

    /// Set the environment variable prefix for overrides.
    ///
    /// With prefix `REQPARAMS`:
    /// - `REQPARAMS__PARAMETERS__NAME=input`
    /// - `REQPARAMS__PARAMETERS__MAX_ERRORS_PER_FIELD=3`
    /// - `REQPARAMS__LOGGING__FORMAT=pretty`
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Load a `.env` file into the process environment, if one exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a `.env` file exists but cannot be parsed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(ConfigError::env_parse_error(".env", e.to_string())),
        }
    }

    /// Apply environment overrides (if a prefix was set) and validate.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an override does not parse or validation
    /// fails.
    pub fn load(mut self) -> Result<ParametersConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            let marker = format!("{prefix}__");
            let mut vars: Vec<(String, String)> = env::vars().filter(|(k, _)| k.starts_with(&marker)).collect();
            vars.sort();
            for (key, value) in vars {
                self.apply_env_var(&key, &value, &prefix)?;
            }
        }

        self.config.validate()?;
        Ok(self.config)
    }

    /// Return the configuration without env overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> ParametersConfig {
        self.config
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let rest = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env_parse_error(key, "invalid key format"))?;

        let parts: Vec<&str> = rest.split("__").collect();
        let parameters = &mut self.config.parameters;
        let logging = &mut self.config.logging;

        match parts.as_slice() {
            ["PARAMETERS", "RAW_NAME"] => parameters.raw_name = value.to_string(),
            ["PARAMETERS", "NAME"] => parameters.name = value.to_string(),
            ["PARAMETERS", "ERROR_MESSAGE"] => parameters.error_message = value.to_string(),
            ["PARAMETERS", "MAX_ERRORS_PER_FIELD"] => {
                parameters.max_errors_per_field = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?;
            }

            ["LOGGING", "ENABLED"] => {
                logging.enabled =
                    parse_bool(value).ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["LOGGING", "LEVEL"] => logging.level = value.to_string(),
            ["LOGGING", "FORMAT"] => {
                logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => return Err(ConfigError::env_parse_error(key, "expected 'json' or 'pretty'")),
                };
            }
            ["LOGGING", "INCLUDE_LOCATION"] => {
                logging.include_location =
                    parse_bool(value).ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }

            _ => return Err(ConfigError::env_parse_error(key, "unknown configuration key")),
        }

        Ok(())
    }
}

fn parse(content: &str, format: &str) -> Result<ParametersConfig, ConfigError> {
    match format {
        "toml" => Ok(toml::from_str(content)?),
        "json" => Ok(serde_json::from_str(content)?),
        other => Err(ConfigError::unsupported_format(other)),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_loader_new() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config, ParametersConfig::default());
    }

    #[test]
    fn test_loader_with_string_toml() {
        let toml = r#"
            [parameters]
            raw_name = "raw"
            error_message = "Invalid request"
            max_errors_per_field = 3

            [logging]
            level = "warn"
            format = "pretty"
        "#;

        let config = ConfigLoader::new()
            .with_string(toml, "toml")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.parameters.raw_name, "raw");
        assert_eq!(config.parameters.name, "parameters");
        assert_eq!(config.parameters.error_message, "Invalid request");
        assert_eq!(config.parameters.max_errors_per_field, 3);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_loader_with_string_json_aliases() {
        let json = r#"{"parameters": {"rawParamsName": "raw", "paramsName": "input"}}"#;

        let config = ConfigLoader::new()
            .with_string(json, "JSON")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.parameters.raw_name, "raw");
        assert_eq!(config.parameters.name, "input");
    }

    #[test]
    fn test_loader_rejects_unknown_keys() {
        let toml = r#"
            [parameters]
            passthrough = true
        "#;
        assert!(matches!(
            ConfigLoader::new().with_string(toml, "toml"),
            Err(ConfigError::TomlError(_))
        ));

        assert!(ConfigLoader::new().with_string(r#"{"server": {}}"#, "json").is_err());
    }

    #[test]
    fn test_loader_rejects_unknown_format() {
        assert!(matches!(
            ConfigLoader::new().with_string("", "yaml"),
            Err(ConfigError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_loader_validates() {
        let toml = r#"
            [parameters]
            max_errors_per_field = 0
        "#;
        let result = ConfigLoader::new().with_string(toml, "toml").unwrap().load();
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_loader_with_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[parameters]\nname = \"input\"").unwrap();

        let config = ConfigLoader::new()
            .with_file(file.path())
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.parameters.name, "input");
    }

    #[test]
    fn test_loader_with_file_bad_extension() {
        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        assert!(matches!(
            ConfigLoader::new().with_file(file.path()),
            Err(ConfigError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_loader_with_file_not_found() {
        assert!(matches!(
            ConfigLoader::new().with_file("/nonexistent/reqparams.toml"),
            Err(ConfigError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_loader_with_optional_file_not_found() {
        let config = ConfigLoader::new()
            .with_optional_file("/nonexistent/reqparams.toml")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config, ParametersConfig::default());
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool("On"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_apply_env_var_parameters() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("TEST__PARAMETERS__NAME", "input", "TEST").unwrap();
        loader
            .apply_env_var("TEST__PARAMETERS__MAX_ERRORS_PER_FIELD", "5", "TEST")
            .unwrap();
        assert_eq!(loader.config.parameters.name, "input");
        assert_eq!(loader.config.parameters.max_errors_per_field, 5);
    }

    #[test]
    fn test_apply_env_var_logging() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("TEST__LOGGING__FORMAT", "pretty", "TEST").unwrap();
        loader.apply_env_var("TEST__LOGGING__INCLUDE_LOCATION", "yes", "TEST").unwrap();
        assert_eq!(loader.config.logging.format, LogFormat::Pretty);
        assert!(loader.config.logging.include_location);
    }

    #[test]
    fn test_apply_env_var_errors() {
        let mut loader = ConfigLoader::new();
        assert!(loader
            .apply_env_var("TEST__PARAMETERS__MAX_ERRORS_PER_FIELD", "many", "TEST")
            .is_err());
        assert!(loader.apply_env_var("TEST__LOGGING__FORMAT", "xml", "TEST").is_err());
        assert!(loader.apply_env_var("TEST__SERVER__PORT", "80", "TEST").is_err());
    }

    #[test]
    fn test_env_prefix_is_applied_on_load() {
        env::set_var("REQPARAMS_LOADER_TEST__PARAMETERS__ERROR_MESSAGE", "From env");

        let config = ConfigLoader::new()
            .with_env_prefix("reqparams_loader_test")
            .load()
            .unwrap();
        assert_eq!(config.parameters.error_message, "From env");

        env::remove_var("REQPARAMS_LOADER_TEST__PARAMETERS__ERROR_MESSAGE");
    }
}
