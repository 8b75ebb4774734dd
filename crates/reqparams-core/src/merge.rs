//! Parameter merging.
//!
//! Query, body and path parameters are combined into one object. The order
//! is fixed: query first, then body, then path, so path parameters win every
//! conflict and body parameters win over query parameters.

use serde_json::{Map, Value};

/// A JSON object used as a parameter bag.
pub type Params = Map<String, Value>;

/// Deep-merges `source` into `target`.
///
/// Objects present on both sides are merged key by key. Any other value in
/// `source` replaces what `target` holds, arrays included.
///
/// Arrays are replaced whole, never merged index by index: a body list of one
/// tag fully supersedes three repeated `tag` query keys.
///
/// # Example
///
/// ```
/// use reqparams_core::merge::deep_merge;
/// use serde_json::json;
///
/// let mut target = json!({ "page": { "size": 10, "number": 1 }, "tags": ["a"] });
/// let source = json!({ "page": { "number": 3 }, "tags": ["b"] });
///
/// deep_merge(
///     target.as_object_mut().unwrap(),
///     source.as_object().unwrap().clone(),
/// );
///
/// assert_eq!(target, json!({ "page": { "size": 10, "number": 3 }, "tags": ["b"] }));
/// ```
pub fn deep_merge(target: &mut Params, source: Params) {
    for (key, incoming) in source {
        match (target.get_mut(&key), incoming) {
            (Some(Value::Object(existing)), Value::Object(nested)) => deep_merge(existing, nested),
            (_, incoming) => {
                target.insert(key, incoming);
            }
        }
    }
}

/// The three parameter sources of a request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSources {
    /// Parameters parsed from the query string.
    pub query: Params,
    /// Parameters parsed from the request body.
    pub body: Params,
    /// Parameters captured from the route path.
    pub path: Params,
}

impl ParameterSources {
    /// Creates a set of sources.
    #[must_use]
    pub fn new(query: Params, body: Params, path: Params) -> Self {
        Self { query, body, path }
    }

    /// Merges the sources in precedence order: query, body, path.
    #[must_use]
    pub fn merge(self) -> Params {
        let mut merged = Params::new();
        deep_merge(&mut merged, self.query);
        deep_merge(&mut merged, self.body);
        deep_merge(&mut merged, self.path);
        merged
    }
}
