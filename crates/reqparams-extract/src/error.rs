//! Extraction error types.
//!
//! An extraction error means the request could not be turned into a
//! parameter object at all. These are not validation failures; the
//! middleware forwards them as unexpected errors.

use http::StatusCode;
use std::fmt;
use thiserror::Error;

/// Where a parameter source was being read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionSource {
    /// Route path segments
    Path,
    /// Query string
    Query,
    /// Request body
    Body,
    /// A request header
    Header,
}

impl fmt::Display for ExtractionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path => write!(f, "path"),
            Self::Query => write!(f, "query"),
            Self::Body => write!(f, "body"),
            Self::Header => write!(f, "header"),
        }
    }
}

/// Error that occurs while collecting request parameters.
///
/// # Example
///
/// ```rust
/// use reqparams_extract::{ExtractionError, ExtractionSource};
/// use http::StatusCode;
///
/// let err = ExtractionError::malformed(ExtractionSource::Body, "expected value at line 1 column 1");
/// assert_eq!(err.source_kind(), ExtractionSource::Body);
/// assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    /// The source could not be parsed.
    #[error("failed to parse {source_kind}: {details}")]
    Malformed {
        /// Source being parsed.
        source_kind: ExtractionSource,
        /// Parser message.
        details: String,
    },

    /// A JSON body parsed, but is not an object.
    #[error("request body must be a JSON object, got {found}")]
    NotAnObject {
        /// JSON kind that was supplied instead.
        found: &'static str,
    },

    /// The body exceeds the configured limit.
    #[error("payload too large: max {max_size} bytes, got {actual_size} bytes")]
    PayloadTooLarge {
        /// Configured limit.
        max_size: usize,
        /// Body length.
        actual_size: usize,
    },
}

impl ExtractionError {
    /// Creates a parse error for a source.
    #[must_use]
    pub fn malformed(source: ExtractionSource, details: impl Into<String>) -> Self {
        Self::Malformed {
            source_kind: source,
            details: details.into(),
        }
    }

    /// Returns the source the error relates to.
    #[must_use]
    pub fn source_kind(&self) -> ExtractionSource {
        match self {
            Self::Malformed { source_kind, .. } => *source_kind,
            Self::NotAnObject { .. } | Self::PayloadTooLarge { .. } => ExtractionSource::Body,
        }
    }

    /// Returns the HTTP status a host would typically answer with.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Malformed { .. } | Self::NotAnObject { .. } => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }

    /// Returns the error code used in error envelopes.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Malformed { .. } => "MALFORMED_PARAMETERS",
            Self::NotAnObject { .. } => "INVALID_BODY",
            Self::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
        }
    }
}
