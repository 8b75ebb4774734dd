//! Read-only view of a request.
//!
//! The [`ExtractionContext`] is what parameter sources, schema selectors and
//! dynamic error messages get to look at.

use crate::params::PathParams;
use bytes::Bytes;
use http::request::Parts;
use http::{HeaderMap, Method, Uri};

/// Everything a parameter source may need from a request.
///
/// # Example
///
/// ```rust
/// use reqparams_extract::{ExtractionContext, PathParams};
/// use http::{HeaderMap, Method, Uri};
/// use bytes::Bytes;
///
/// let mut params = PathParams::new();
/// params.push("id", "123");
///
/// let ctx = ExtractionContext::new(
///     Method::GET,
///     Uri::from_static("/books/123?fields=title"),
///     HeaderMap::new(),
///     Bytes::new(),
///     params,
/// );
///
/// assert_eq!(ctx.path(), "/books/123");
/// assert_eq!(ctx.query_string(), Some("fields=title"));
/// assert_eq!(ctx.path_params().get("id"), Some("123"));
/// ```
#[derive(Debug, Clone)]
pub struct ExtractionContext {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    path_params: PathParams,
}

impl ExtractionContext {
    /// Creates a new extraction context.
    #[must_use]
    pub fn new(
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        body: Bytes,
        path_params: PathParams,
    ) -> Self {
        Self {
            method,
            uri,
            headers,
            body,
            path_params,
        }
    }

    /// Creates a context from request parts and a collected body.
    ///
    /// Path parameters are taken from the [`PathParams`] extension if a
    /// router inserted one; otherwise the set is empty.
    #[must_use]
    pub fn from_parts(parts: &Parts, body: Bytes) -> Self {
        Self {
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            headers: parts.headers.clone(),
            body,
            path_params: parts.extensions.get::<PathParams>().cloned().unwrap_or_default(),
        }
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the path portion of the URI.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Returns the query string if present.
    #[must_use]
    pub fn query_string(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value as a string.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the Content-Type header value.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Returns the request body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the captured path parameters.
    #[must_use]
    pub fn path_params(&self) -> &PathParams {
        &self.path_params
    }
}

/// Builder for an [`ExtractionContext`], mostly useful in tests.
///
/// Method defaults to `GET` and the URI to `/`.
#[derive(Debug, Default)]
pub struct ExtractionContextBuilder {
    method: Option<Method>,
    uri: Option<Uri>,
    headers: HeaderMap,
    body: Bytes,
    path_params: PathParams,
}

impl ExtractionContextBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the HTTP method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Sets the URI.
    #[must_use]
    pub fn uri(mut self, uri: Uri) -> Self {
        self.uri = Some(uri);
        self
    }

    /// Adds a header. Invalid header values are ignored.
    #[must_use]
    pub fn header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = value.parse() {
            self.headers.insert(name, value);
        }
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Adds a path parameter.
    #[must_use]
    pub fn path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.push(name, value);
        self
    }

    /// Builds the context.
    #[must_use]
    pub fn build(self) -> ExtractionContext {
        ExtractionContext {
            method: self.method.unwrap_or(Method::GET),
            uri: self.uri.unwrap_or_else(|| Uri::from_static("/")),
            headers: self.headers,
            body: self.body,
            path_params: self.path_params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let ctx = ExtractionContextBuilder::new()
            .method(Method::POST)
            .uri(Uri::from_static("/books?draft=1"))
            .header("content-type", "application/json")
            .body(r#"{"name": "Dune"}"#)
            .path_param("shelf", "scifi")
            .build();

        assert_eq!(ctx.method(), &Method::POST);
        assert_eq!(ctx.path(), "/books");
        assert_eq!(ctx.query_string(), Some("draft=1"));
        assert_eq!(ctx.content_type(), Some("application/json"));
        assert_eq!(ctx.body().as_ref(), br#"{"name": "Dune"}"#);
        assert_eq!(ctx.path_params().get("shelf"), Some("scifi"));
    }

    #[test]
    fn test_builder_defaults() {
        let ctx = ExtractionContextBuilder::new().build();
        assert_eq!(ctx.method(), &Method::GET);
        assert_eq!(ctx.path(), "/");
        assert!(ctx.body().is_empty());
        assert!(ctx.path_params().is_empty());
    }

    #[test]
    fn test_from_parts_reads_path_params_extension() {
        let mut params = PathParams::new();
        params.push("id", "9");

        let request = http::Request::builder()
            .method(Method::PUT)
            .uri("/books/9")
            .header("x-request-id", "abc")
            .extension(params)
            .body(())
            .unwrap();
        let (parts, ()) = request.into_parts();

        let ctx = ExtractionContext::from_parts(&parts, Bytes::from_static(b"x"));
        assert_eq!(ctx.method(), &Method::PUT);
        assert_eq!(ctx.header("x-request-id"), Some("abc"));
        assert_eq!(ctx.path_params().get("id"), Some("9"));
        assert_eq!(ctx.body().as_ref(), b"x");
    }

    #[test]
    fn test_from_parts_without_router() {
        let (parts, ()) = http::Request::builder().uri("/").body(()).unwrap().into_parts();
        let ctx = ExtractionContext::from_parts(&parts, Bytes::new());
        assert!(ctx.path_params().is_empty());
    }
}
