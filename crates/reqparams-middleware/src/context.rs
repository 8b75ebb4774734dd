//! Middleware context types.
//!
//! The [`MiddlewareContext`] is the per-request state bag. The parameters
//! middleware writes the merged raw parameters and the transformed output
//! into its named value store; handlers read them back, optionally as typed
//! structs via [`MiddlewareContext::parameters`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::time::Instant;
use thiserror::Error;
use uuid::Uuid;

/// A unique identifier for a request (UUID v7, time-ordered).
///
/// # Example
///
/// ```
/// use reqparams_middleware::context::RequestId;
///
/// let id = RequestId::new();
/// assert_eq!(id.to_string().len(), 36);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Wraps an existing UUID, e.g. one propagated by an upstream service.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors reading a named value back out of the context.
#[derive(Debug, Error)]
pub enum ContextError {
    /// Nothing is stored under the name.
    #[error("no value stored under '{name}'")]
    Missing {
        /// The requested name.
        name: String,
    },

    /// The stored value does not fit the requested type.
    #[error("value stored under '{name}' does not match the requested type")]
    Deserialize {
        /// The requested name.
        name: String,
        /// The underlying serde error.
        #[source]
        source: serde_json::Error,
    },
}

/// Context that flows through the middleware chain.
///
/// # Example
///
/// ```
/// use reqparams_middleware::context::MiddlewareContext;
/// use serde::Deserialize;
/// use serde_json::json;
///
/// #[derive(Deserialize)]
/// struct Book {
///     name: String,
/// }
///
/// let mut ctx = MiddlewareContext::new();
/// ctx.set_value("parameters", json!({ "name": "Dune" }));
///
/// let book: Book = ctx.parameters("parameters").unwrap();
/// assert_eq!(book.name, "Dune");
/// ```
#[derive(Debug)]
pub struct MiddlewareContext {
    request_id: RequestId,
    started_at: Instant,

    /// Named JSON values (raw and transformed parameters).
    values: HashMap<String, Value>,

    /// Type-erased extension data.
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl MiddlewareContext {
    /// Creates a new context with a fresh request ID.
    #[must_use]
    pub fn new() -> Self {
        Self::with_request_id(RequestId::new())
    }

    /// Creates a context with a specific request ID.
    #[must_use]
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            started_at: Instant::now(),
            values: HashMap::new(),
            extensions: HashMap::new(),
        }
    }

    /// Returns the request ID.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Sets the request ID.
    pub fn set_request_id(&mut self, request_id: RequestId) {
        self.request_id = request_id;
    }

    /// Returns the elapsed time since the context was created.
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }

    /// Stores a value under a name, replacing any previous value.
    pub fn set_value(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Returns the value stored under a name.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Removes and returns the value stored under a name.
    pub fn take_value(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    /// Returns true if a value is stored under the name.
    #[must_use]
    pub fn has_value(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Deserializes the value stored under `name` into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::Missing`] if nothing is stored under the name
    /// and [`ContextError::Deserialize`] if the value does not fit `T`.
    pub fn parameters<T: DeserializeOwned>(&self, name: &str) -> Result<T, ContextError> {
        let value = self.values.get(name).ok_or_else(|| ContextError::Missing {
            name: name.to_string(),
        })?;
        T::deserialize(value).map_err(|source| ContextError::Deserialize {
            name: name.to_string(),
            source,
        })
    }

    /// Stores a typed extension value.
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Retrieves a typed extension value.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Removes and returns a typed extension value.
    pub fn remove_extension<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|b| *b)
    }

    /// Checks if an extension of the given type exists.
    #[must_use]
    pub fn has_extension<T: Send + Sync + 'static>(&self) -> bool {
        self.extensions.contains_key(&TypeId::of::<T>())
    }
}

impl Default for MiddlewareContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Page {
        number: u32,
        #[serde(default)]
        size: Option<u32>,
    }

    #[test]
    fn test_named_values() {
        let mut ctx = MiddlewareContext::new();
        assert!(!ctx.has_value("rawParameters"));

        ctx.set_value("rawParameters", json!({ "a": 1 }));
        assert_eq!(ctx.value("rawParameters"), Some(&json!({ "a": 1 })));

        ctx.set_value("rawParameters", json!({ "a": 2 }));
        assert_eq!(ctx.take_value("rawParameters"), Some(json!({ "a": 2 })));
        assert!(!ctx.has_value("rawParameters"));
    }

    #[test]
    fn test_typed_parameters() {
        let mut ctx = MiddlewareContext::new();
        ctx.set_value("parameters", json!({ "number": 3 }));

        let page: Page = ctx.parameters("parameters").unwrap();
        assert_eq!(page, Page { number: 3, size: None });
    }

    #[test]
    fn test_typed_parameters_errors() {
        let mut ctx = MiddlewareContext::new();
        assert!(matches!(
            ctx.parameters::<Page>("parameters"),
            Err(ContextError::Missing { .. })
        ));

        ctx.set_value("parameters", json!({ "number": "three" }));
        assert!(matches!(
            ctx.parameters::<Page>("parameters"),
            Err(ContextError::Deserialize { .. })
        ));
    }

    #[test]
    fn test_extensions() {
        #[derive(Debug, PartialEq)]
        struct Marker(u8);

        let mut ctx = MiddlewareContext::new();
        assert!(!ctx.has_extension::<Marker>());

        ctx.set_extension(Marker(7));
        assert_eq!(ctx.get_extension::<Marker>(), Some(&Marker(7)));
        assert_eq!(ctx.remove_extension::<Marker>(), Some(Marker(7)));
        assert!(ctx.get_extension::<Marker>().is_none());
    }

    #[test]
    fn test_request_ids_are_unique() {
        assert_ne!(RequestId::new(), RequestId::new());

        let id = RequestId::new();
        let ctx = MiddlewareContext::with_request_id(id);
        assert_eq!(ctx.request_id(), id);
    }

    #[test]
    fn test_elapsed_grows() {
        let ctx = MiddlewareContext::new();
        let first = ctx.elapsed();
        std::thread::sleep(std::time::Duration::from_millis(2));
        assert!(ctx.elapsed() > first);
    }
}
