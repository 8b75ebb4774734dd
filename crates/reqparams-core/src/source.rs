//! Schema resolution.
//!
//! A [`SchemaSource`] is either a fixed schema or a selector that picks a
//! schema per request. It is generic over the request type `R` so this crate
//! stays independent of any HTTP framework.

use crate::error::{json_kind, SchemaError};
use crate::schema::Schema;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// A function that produces a schema for a request.
pub type SchemaSelector<R> = Arc<dyn Fn(&R) -> Result<Schema, SchemaError> + Send + Sync>;

/// Where the schema for a request comes from.
///
/// # Example
///
/// ```
/// use reqparams_core::{FieldSpec, Schema, SchemaSource};
/// use serde_json::json;
///
/// // Fixed schema
/// let fixed: SchemaSource<str> = SchemaSource::fixed(Schema::default());
///
/// // Schema chosen per request
/// let by_route: SchemaSource<str> = SchemaSource::dynamic(|path: &str| {
///     if path.starts_with("/admin") {
///         Schema::builder().field("token", FieldSpec::new().required()).build()
///     } else {
///         Schema::default()
///     }
/// });
///
/// assert!(by_route.resolve("/admin/users").unwrap().declares("token"));
/// assert!(!by_route.resolve("/users").unwrap().declares("token"));
///
/// // Anything other than an object is rejected up front
/// assert!(SchemaSource::<str>::from_value(json!(null)).is_err());
/// ```
pub enum SchemaSource<R: ?Sized> {
    /// The same schema for every request.
    Static(Arc<Schema>),
    /// A schema selected per request.
    Dynamic(SchemaSelector<R>),
}

impl<R: ?Sized> SchemaSource<R> {
    /// A fixed schema.
    #[must_use]
    pub fn fixed(schema: Schema) -> Self {
        Self::Static(Arc::new(schema))
    }

    /// A schema selected per request by an infallible function.
    pub fn dynamic<F>(selector: F) -> Self
    where
        F: Fn(&R) -> Schema + Send + Sync + 'static,
    {
        Self::Dynamic(Arc::new(move |request| Ok(selector(request))))
    }

    /// A schema selected per request by a function that may fail.
    ///
    /// A failure surfaces as an unexpected error for that request only.
    pub fn try_dynamic<F>(selector: F) -> Self
    where
        F: Fn(&R) -> Result<Schema, SchemaError> + Send + Sync + 'static,
    {
        Self::Dynamic(Arc::new(selector))
    }

    /// A schema document selected per request, parsed on every call.
    pub fn dynamic_document<F>(selector: F) -> Self
    where
        F: Fn(&R) -> Value + Send + Sync + 'static,
    {
        Self::Dynamic(Arc::new(move |request| Schema::from_value(&selector(request))))
    }

    /// Builds a fixed source from a schema document.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidShape`] when `document` is not an
    /// object (null, boolean, array, ...), or a field-level error when the
    /// object is malformed.
    pub fn from_value(document: Value) -> Result<Self, SchemaError> {
        match &document {
            Value::Object(map) => Ok(Self::fixed(Schema::from_map(map)?)),
            other => Err(SchemaError::InvalidShape {
                found: json_kind(other),
            }),
        }
    }

    /// Resolves the schema for a request.
    pub fn resolve(&self, request: &R) -> Result<Arc<Schema>, SchemaError> {
        match self {
            Self::Static(schema) => Ok(Arc::clone(schema)),
            Self::Dynamic(selector) => selector(request).map(Arc::new),
        }
    }

    /// Returns `true` for per-request sources.
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::Dynamic(_))
    }
}

impl<R: ?Sized> Clone for SchemaSource<R> {
    fn clone(&self) -> Self {
        match self {
            Self::Static(schema) => Self::Static(Arc::clone(schema)),
            Self::Dynamic(selector) => Self::Dynamic(Arc::clone(selector)),
        }
    }
}

impl<R: ?Sized> fmt::Debug for SchemaSource<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(schema) => f.debug_tuple("Static").field(schema).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl<R: ?Sized> From<Schema> for SchemaSource<R> {
    fn from(schema: Schema) -> Self {
        Self::fixed(schema)
    }
}

impl<R: ?Sized> From<Arc<Schema>> for SchemaSource<R> {
    fn from(schema: Arc<Schema>) -> Self {
        Self::Static(schema)
    }
}

impl<R: ?Sized> TryFrom<Value> for SchemaSource<R> {
    type Error = SchemaError;

    fn try_from(document: Value) -> Result<Self, Self::Error> {
        Self::from_value(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldSpec;
    use serde_json::json;

    #[test]
    fn test_static_source_shares_schema() {
        let source: SchemaSource<()> = SchemaSource::fixed(
            Schema::builder().field("name", FieldSpec::new()).build(),
        );

        let first = source.resolve(&()).unwrap();
        let second = source.resolve(&()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(!source.is_dynamic());
    }

    #[test]
    fn test_dynamic_source_is_called_per_request() {
        let source: SchemaSource<u32> = SchemaSource::dynamic(|version: &u32| {
            let field = if *version >= 2 { "title" } else { "name" };
            Schema::builder().field(field, FieldSpec::new()).build()
        });

        assert!(source.is_dynamic());
        assert!(source.resolve(&1).unwrap().declares("name"));
        assert!(source.resolve(&2).unwrap().declares("title"));
    }

    #[test]
    fn test_construction_rejects_wrong_shapes() {
        for document in [json!(null), json!(false), json!([{ "a": 1 }]), json!(7)] {
            let err = SchemaSource::<()>::from_value(document.clone()).unwrap_err();
            assert!(
                err.to_string()
                    .contains("schema must be either plain object or function returning a schema object"),
                "{document}"
            );
        }
    }

    #[test]
    fn test_dynamic_document_reports_malformed_schema() {
        let source: SchemaSource<()> = SchemaSource::dynamic_document(|_| json!({ "name": 1 }));
        assert!(matches!(
            source.resolve(&()),
            Err(SchemaError::InvalidField { .. })
        ));
    }

    #[test]
    fn test_debug_hides_selector() {
        let source: SchemaSource<()> = SchemaSource::dynamic(|_| Schema::default());
        assert_eq!(format!("{source:?}"), "Dynamic(..)");
    }
}
