//! Configuration section types.

use reqparams_core::DEFAULT_MAX_ERRORS_PER_FIELD;
use reqparams_middleware::{OptionOverrides, DEFAULT_ERROR_MESSAGE, DEFAULT_NAME, DEFAULT_RAW_NAME};
use reqparams_telemetry::{LogConfig, LogFormat};
use serde::{Deserialize, Serialize};

/// The `[parameters]` section: process-wide option defaults.
///
/// The camelCase spellings used by JavaScript hosts are accepted as aliases.
///
/// # Example
///
/// ```
/// use reqparams_config::ParametersSection;
///
/// let section = ParametersSection::default();
/// assert_eq!(section.raw_name, "rawParameters");
/// assert_eq!(section.name, "parameters");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ParametersSection {
    /// Context slot for the merged raw parameters.
    #[serde(default = "default_raw_name", alias = "rawName", alias = "rawParamsName")]
    pub raw_name: String,

    /// Context slot for the transformed parameters.
    #[serde(default = "default_name", alias = "paramsName")]
    pub name: String,

    /// Message passed to the error factory on rejection.
    #[serde(default = "default_error_message", alias = "errorMessage")]
    pub error_message: String,

    /// Failures recorded per field before moving on.
    #[serde(default = "default_max_errors_per_field", alias = "maxErrorsPerField")]
    pub max_errors_per_field: usize,
}

impl Default for ParametersSection {
    fn default() -> Self {
        Self {
            raw_name: default_raw_name(),
            name: default_name(),
            error_message: default_error_message(),
            max_errors_per_field: default_max_errors_per_field(),
        }
    }
}

impl ParametersSection {
    /// Converts the section into an options layer for a
    /// [`ParametersFactory`](reqparams_middleware::ParametersFactory).
    ///
    /// ```
    /// use reqparams_config::ParametersSection;
    /// use reqparams_middleware::ParametersFactory;
    ///
    /// let section = ParametersSection {
    ///     name: "input".to_string(),
    ///     ..Default::default()
    /// };
    /// let factory = ParametersFactory::new().with_defaults(section.to_overrides());
    /// assert!(!factory.defaults().is_empty());
    /// ```
    #[must_use]
    pub fn to_overrides<E>(&self) -> OptionOverrides<E> {
        OptionOverrides::new()
            .raw_name(self.raw_name.clone())
            .name(self.name.clone())
            .error_message(self.error_message.clone())
            .max_errors_per_field(self.max_errors_per_field)
    }
}

fn default_raw_name() -> String {
    DEFAULT_RAW_NAME.to_string()
}

fn default_name() -> String {
    DEFAULT_NAME.to_string()
}

fn default_error_message() -> String {
    DEFAULT_ERROR_MESSAGE.to_string()
}

fn default_max_errors_per_field() -> usize {
    DEFAULT_MAX_ERRORS_PER_FIELD
}

/// The `[logging]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Whether to install a subscriber at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive (e.g., "info" or "reqparams_middleware=debug").
    #[serde(default = "default_level")]
    pub level: String,

    /// `json` or `pretty`.
    #[serde(default)]
    pub format: LogFormat,

    /// Include file and line numbers.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_level(),
            format: LogFormat::default(),
            include_location: false,
        }
    }
}

impl LoggingSection {
    /// Converts the section into a telemetry [`LogConfig`].
    #[must_use]
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            format: self.format,
            include_location: self.include_location,
            ..LogConfig::default()
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_level() -> String {
    "info".to_string()
}
