//! Logging setup for reqparams.
//!
//! The middleware crates only emit `tracing` events; this crate installs the
//! subscriber that prints them. Output is JSON (one object per line) for
//! production or a pretty multi-line format for development.
//!
//! # Example
//!
//! ```rust,ignore
//! use reqparams_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//!
//! tracing::info!(request_id = %id, count = 2, "parameters rejected");
//! ```

#![doc(html_root_url = "https://docs.rs/reqparams-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
