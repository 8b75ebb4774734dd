//! Parameter sources.
//!
//! Turns the three raw parts of a request into JSON objects:
//!
//! | Source | Parsed with | Values |
//! |--------|-------------|--------|
//! | Query string | `serde_urlencoded` | strings; repeated keys become arrays |
//! | Body (`application/json`, `*+json`) | `serde_json` | must be an object |
//! | Body (`application/x-www-form-urlencoded`) | `serde_urlencoded` | as for the query |
//! | Path | [`PathParams`] extension | strings |
//!
//! An empty body contributes nothing whatever its content type. A body whose
//! content type has no parser, or which has no content type at all, is
//! skipped and contributes nothing either.

use crate::error::{ExtractionError, ExtractionSource};
use crate::extractor::FromRequest;
use crate::params::PathParams;
use crate::ExtractionContext;
use reqparams_core::{json_kind, ParameterSources, Params};
use serde_json::Value;
use tracing::debug;

/// Default body size limit (1 MB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// Body formats the collector understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    /// `application/json` or any `+json` media type
    Json,
    /// `application/x-www-form-urlencoded`
    Form,
}

impl BodyFormat {
    /// Determines the format from a Content-Type value.
    ///
    /// Parameters such as `charset` are ignored, and matching is case-insensitive.
    #[must_use]
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        if essence == "application/json" || (essence.starts_with("application/") && essence.ends_with("+json")) {
            Some(Self::Json)
        } else if essence == "application/x-www-form-urlencoded" {
            Some(Self::Form)
        } else {
            None
        }
    }
}

/// Parses URL-encoded pairs into an object.
///
/// A key that appears more than once collects its values into an array in
/// order of appearance.
///
/// # Errors
///
/// Returns [`ExtractionError::Malformed`] if the input cannot be decoded.
pub fn parse_urlencoded(source: ExtractionSource, input: &[u8]) -> Result<Params, ExtractionError> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(input)
        .map_err(|e| ExtractionError::malformed(source, e.to_string()))?;

    let mut params = Params::new();
    for (key, value) in pairs {
        match params.get_mut(&key) {
            Some(Value::Array(values)) => values.push(Value::String(value)),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(value)]);
            }
            None => {
                params.insert(key, Value::String(value));
            }
        }
    }
    Ok(params)
}

/// Query string parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams(pub Params);

impl FromRequest for QueryParams {
    fn from_request(ctx: &ExtractionContext) -> Result<Self, ExtractionError> {
        let query = ctx.query_string().unwrap_or_default();
        parse_urlencoded(ExtractionSource::Query, query.as_bytes()).map(QueryParams)
    }
}

/// Body parameters, subject to [`DEFAULT_MAX_BODY_SIZE`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BodyParams(pub Params);

impl FromRequest for BodyParams {
    fn from_request(ctx: &ExtractionContext) -> Result<Self, ExtractionError> {
        parse_body(ctx, DEFAULT_MAX_BODY_SIZE).map(BodyParams)
    }
}

impl FromRequest for PathParams {
    fn from_request(ctx: &ExtractionContext) -> Result<Self, ExtractionError> {
        Ok(ctx.path_params().clone())
    }
}

impl FromRequest for ParameterSources {
    fn from_request(ctx: &ExtractionContext) -> Result<Self, ExtractionError> {
        ParameterCollector::default().collect(ctx)
    }
}

fn parse_body(ctx: &ExtractionContext, max_body_size: usize) -> Result<Params, ExtractionError> {
    let body = ctx.body();
    if body.is_empty() {
        return Ok(Params::new());
    }
    if body.len() > max_body_size {
        return Err(ExtractionError::PayloadTooLarge {
            max_size: max_body_size,
            actual_size: body.len(),
        });
    }

    match ctx.content_type().and_then(BodyFormat::from_content_type) {
        Some(BodyFormat::Json) => {
            let value: Value = serde_json::from_slice(body)
                .map_err(|e| ExtractionError::malformed(ExtractionSource::Body, e.to_string()))?;
            match value {
                Value::Object(map) => Ok(map),
                other => Err(ExtractionError::NotAnObject {
                    found: json_kind(&other),
                }),
            }
        }
        Some(BodyFormat::Form) => parse_urlencoded(ExtractionSource::Body, body),
        None => {
            debug!(
                content_type = ctx.content_type().unwrap_or("none"),
                size = body.len(),
                "body ignored: no parser for content type"
            );
            Ok(Params::new())
        }
    }
}

/// Collects the query, body and path sources of a request.
///
/// # Example
///
/// ```rust
/// use reqparams_extract::{ExtractionContextBuilder, ParameterCollector};
/// use http::{Method, Uri};
/// use serde_json::json;
///
/// let ctx = ExtractionContextBuilder::new()
///     .method(Method::POST)
///     .uri(Uri::from_static("/books/1?a=1"))
///     .header("content-type", "application/json")
///     .body(r#"{"a": 2, "b": 3}"#)
///     .path_param("a", "4")
///     .build();
///
/// let merged = ParameterCollector::new().collect(&ctx).unwrap().merge();
/// assert_eq!(serde_json::Value::Object(merged), json!({ "a": "4", "b": 3 }));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ParameterCollector {
    max_body_size: usize,
}

impl ParameterCollector {
    /// Creates a collector with the default body limit.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }

    /// Sets the body size limit in bytes.
    #[must_use]
    pub const fn max_body_size(mut self, bytes: usize) -> Self {
        self.max_body_size = bytes;
        self
    }

    /// Parses all three sources.
    ///
    /// # Errors
    ///
    /// Returns an [`ExtractionError`] if the query or body cannot be parsed,
    /// or if the body is too large.
    pub fn collect(&self, ctx: &ExtractionContext) -> Result<ParameterSources, ExtractionError> {
        let QueryParams(query) = QueryParams::from_request(ctx)?;
        let body = parse_body(ctx, self.max_body_size)?;
        let path = ctx.path_params().to_object();
        Ok(ParameterSources::new(query, body, path))
    }
}

impl Default for ParameterCollector {
    fn default() -> Self {
        Self::new()
    }
}
