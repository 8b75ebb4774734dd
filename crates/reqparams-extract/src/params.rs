//! Path parameters captured by a router.
//!
//! Routers insert a [`PathParams`] value into the request extensions after
//! matching; the parameter collector reads it back from there.

use reqparams_core::Params;
use serde_json::Value;
use smallvec::SmallVec;

/// Number of parameters stored inline before spilling to the heap.
const INLINE_PARAMS: usize = 4;

/// Named path segments captured by a route match.
///
/// Values are kept as strings; no type coercion happens here.
///
/// # Example
///
/// ```rust
/// use reqparams_extract::PathParams;
///
/// let mut params = PathParams::new();
/// params.push("bookId", "42");
///
/// assert_eq!(params.get("bookId"), Some("42"));
/// assert_eq!(params.to_object()["bookId"], "42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathParams {
    inner: SmallVec<[(String, String); INLINE_PARAMS]>,
}

impl PathParams {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter. A later push of the same name shadows earlier ones.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.push((name.into(), value.into()));
    }

    /// Returns the value of a parameter.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if no parameters were captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of captured parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Iterates over `(name, value)` pairs in capture order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Converts the parameters into a JSON object of strings.
    #[must_use]
    pub fn to_object(&self) -> Params {
        self.iter()
            .map(|(name, value)| (name.to_string(), Value::String(value.to_string())))
            .collect()
    }
}

impl<N, V> FromIterator<(N, V)> for PathParams
where
    N: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().map(|(n, v)| (n.into(), v.into())).collect(),
        }
    }
}
