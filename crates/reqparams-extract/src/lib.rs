//! # Reqparams Extract
//!
//! Parameter sources for the request parameter middleware.
//!
//! This crate turns an HTTP request into the three parameter objects the
//! pipeline merges:
//!
//! | Type | Source | Description |
//! |------|--------|-------------|
//! | [`QueryParams`] | Query string | URL-decoded string values |
//! | [`BodyParams`] | Request body | JSON object or URL-encoded form |
//! | [`PathParams`] | Router | Captured path segments, read from request extensions |
//! | [`ParameterSources`] | All three | Ready to merge |
//!
//! ## Example
//!
//! ```rust
//! use reqparams_extract::{ExtractionContextBuilder, FromRequest, ParameterSources};
//! use http::Uri;
//!
//! let ctx = ExtractionContextBuilder::new()
//!     .uri(Uri::from_static("/books/42?include=author"))
//!     .path_param("id", "42")
//!     .build();
//!
//! let merged = ParameterSources::from_request(&ctx).unwrap().merge();
//! assert_eq!(merged["id"], "42");
//! assert_eq!(merged["include"], "author");
//! ```
//!
//! ## Error Handling
//!
//! Sources that cannot be parsed produce an [`ExtractionError`]. These are
//! not validation failures: a request whose body is not JSON never reaches
//! the rules.

#![doc(html_root_url = "https://docs.rs/reqparams-extract/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod error;
mod extractor;
mod params;
mod sources;

pub use context::{ExtractionContext, ExtractionContextBuilder};
pub use error::{ExtractionError, ExtractionSource};
pub use extractor::FromRequest;
pub use params::PathParams;
pub use sources::{
    parse_urlencoded, BodyFormat, BodyParams, ParameterCollector, QueryParams, DEFAULT_MAX_BODY_SIZE,
};

pub use reqparams_core::ParameterSources;
