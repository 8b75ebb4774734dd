//! Typed, layered configuration for reqparams.
//!
//! - TOML and JSON files
//! - Environment variable overrides
//! - Strict parsing (unknown keys are errors)
//! - Layering: defaults → file → env
//!
//! # Example
//!
//! ```no_run
//! use reqparams_config::ConfigLoader;
//! use reqparams_middleware::ParametersFactory;
//! use reqparams_telemetry::init_logging;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigLoader::new()
//!     .with_defaults()
//!     .with_optional_file("reqparams.toml")?
//!     .with_env_prefix("REQPARAMS")
//!     .load()?;
//!
//! init_logging(&config.logging.to_log_config())?;
//! let factory = ParametersFactory::new().with_defaults(config.parameters.to_overrides());
//! # Ok(())
//! # }
//! ```
//!
//! # File Format
//!
//! ```toml
//! [parameters]
//! raw_name = "rawParameters"
//! name = "parameters"
//! error_message = "Bad Request"
//! max_errors_per_field = 1
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"
//! include_location = false
//! ```

#![doc(html_root_url = "https://docs.rs/reqparams-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::ParametersConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{LoggingSection, ParametersSection};
