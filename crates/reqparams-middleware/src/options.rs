//! Handler options and their precedence.
//!
//! Options come in layers. A [`OptionOverrides`] layer sets some options and
//! leaves the rest alone; [`Options::resolve`] stacks the layers on top of
//! the built-in defaults:
//!
//! ```text
//! built-in defaults  <  factory defaults  <  call-site overrides
//! ```
//!
//! | Option | Built-in |
//! |--------|----------|
//! | `raw_name` | `rawParameters` |
//! | `name` | `parameters` |
//! | `error_message` | `Bad Request` |
//! | `error_factory` | [`BadRequest::new`] |
//! | `max_errors_per_field` | `1` |

use crate::translate::BadRequest;
use reqparams_core::{FailureSet, DEFAULT_MAX_ERRORS_PER_FIELD};
use reqparams_extract::ExtractionContext;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Default context slot for the merged, untransformed parameters.
pub const DEFAULT_RAW_NAME: &str = "rawParameters";

/// Default context slot for the transformed parameters.
pub const DEFAULT_NAME: &str = "parameters";

/// Default message for validation rejections.
pub const DEFAULT_ERROR_MESSAGE: &str = "Bad Request";

/// Builds the error forwarded for a validation failure.
pub type ErrorFactory<E> = Arc<dyn Fn(String, FailureSet) -> E + Send + Sync>;

/// Computes a rejection message from the request.
pub type MessageFn = Arc<dyn Fn(&ExtractionContext) -> String + Send + Sync>;

/// The message passed to the error factory.
#[derive(Clone)]
pub enum ErrorMessage {
    /// The same message for every request.
    Static(String),
    /// A message computed per request.
    Dynamic(MessageFn),
}

impl ErrorMessage {
    /// Produces the message for a request.
    #[must_use]
    pub fn render(&self, request: &ExtractionContext) -> String {
        match self {
            Self::Static(message) => message.clone(),
            Self::Dynamic(message) => message(request),
        }
    }
}

impl fmt::Debug for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(message) => f.debug_tuple("Static").field(message).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl From<&str> for ErrorMessage {
    fn from(message: &str) -> Self {
        Self::Static(message.to_string())
    }
}

impl From<String> for ErrorMessage {
    fn from(message: String) -> Self {
        Self::Static(message)
    }
}

/// Errors resolving options.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionsError {
    /// A context slot name is empty.
    #[error("option '{option}' must not be empty")]
    EmptyName {
        /// The offending option.
        option: &'static str,
    },

    /// `max_errors_per_field` is zero.
    #[error("option 'max_errors_per_field' must be at least 1")]
    ZeroErrorCap,
}

/// A partial set of options.
///
/// # Example
///
/// ```
/// use reqparams_middleware::{OptionOverrides, Options};
///
/// let defaults = OptionOverrides::new().name("params").error_message("Invalid input");
/// let call_site = OptionOverrides::new().name("book");
///
/// let options: Options = Options::resolve(&defaults, &call_site).unwrap();
/// assert_eq!(options.name(), "book");
/// assert_eq!(options.raw_name(), "rawParameters");
/// ```
pub struct OptionOverrides<E = BadRequest> {
    raw_name: Option<String>,
    name: Option<String>,
    error_message: Option<ErrorMessage>,
    error_factory: Option<ErrorFactory<E>>,
    max_errors_per_field: Option<usize>,
}

impl<E> OptionOverrides<E> {
    /// Creates an empty layer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            raw_name: None,
            name: None,
            error_message: None,
            error_factory: None,
            max_errors_per_field: None,
        }
    }

    /// Sets the context slot for raw parameters.
    #[must_use]
    pub fn raw_name(mut self, name: impl Into<String>) -> Self {
        self.raw_name = Some(name.into());
        self
    }

    /// Sets the context slot for transformed parameters.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the rejection message.
    #[must_use]
    pub fn error_message(mut self, message: impl Into<ErrorMessage>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    /// Sets a rejection message computed from the request.
    #[must_use]
    pub fn dynamic_error_message<F>(mut self, message: F) -> Self
    where
        F: Fn(&ExtractionContext) -> String + Send + Sync + 'static,
    {
        self.error_message = Some(ErrorMessage::Dynamic(Arc::new(message)));
        self
    }

    /// Sets the function building the forwarded error.
    #[must_use]
    pub fn error_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(String, FailureSet) -> E + Send + Sync + 'static,
    {
        self.error_factory = Some(Arc::new(factory));
        self
    }

    /// Sets how many failures are recorded per field.
    #[must_use]
    pub fn max_errors_per_field(mut self, max: usize) -> Self {
        self.max_errors_per_field = Some(max);
        self
    }

    /// Stacks `over` on top of this layer; options set in `over` win.
    #[must_use]
    pub fn merge(self, over: Self) -> Self {
        Self {
            raw_name: over.raw_name.or(self.raw_name),
            name: over.name.or(self.name),
            error_message: over.error_message.or(self.error_message),
            error_factory: over.error_factory.or(self.error_factory),
            max_errors_per_field: over.max_errors_per_field.or(self.max_errors_per_field),
        }
    }

    /// Returns true if no option is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw_name.is_none()
            && self.name.is_none()
            && self.error_message.is_none()
            && self.error_factory.is_none()
            && self.max_errors_per_field.is_none()
    }
}

impl<E> Default for OptionOverrides<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for OptionOverrides<E> {
    fn clone(&self) -> Self {
        Self {
            raw_name: self.raw_name.clone(),
            name: self.name.clone(),
            error_message: self.error_message.clone(),
            error_factory: self.error_factory.clone(),
            max_errors_per_field: self.max_errors_per_field,
        }
    }
}

impl<E> fmt::Debug for OptionOverrides<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionOverrides")
            .field("raw_name", &self.raw_name)
            .field("name", &self.name)
            .field("error_message", &self.error_message)
            .field("error_factory", &self.error_factory.as_ref().map(|_| ".."))
            .field("max_errors_per_field", &self.max_errors_per_field)
            .finish()
    }
}

/// A fully resolved, immutable option set.
pub struct Options<E = BadRequest> {
    raw_name: String,
    name: String,
    error_message: ErrorMessage,
    error_factory: ErrorFactory<E>,
    max_errors_per_field: usize,
}

impl<E> Options<E>
where
    E: From<BadRequest> + 'static,
{
    /// Resolves built-in defaults, then `defaults`, then `call_site`.
    ///
    /// The built-in error factory creates a [`BadRequest`] and converts it
    /// into `E`.
    ///
    /// # Errors
    ///
    /// Returns [`OptionsError`] if a slot name is empty or
    /// `max_errors_per_field` is zero.
    pub fn resolve(
        defaults: &OptionOverrides<E>,
        call_site: &OptionOverrides<E>,
    ) -> Result<Self, OptionsError> {
        let layer = defaults.clone().merge(call_site.clone());

        let options = Self {
            raw_name: layer.raw_name.unwrap_or_else(|| DEFAULT_RAW_NAME.to_string()),
            name: layer.name.unwrap_or_else(|| DEFAULT_NAME.to_string()),
            error_message: layer
                .error_message
                .unwrap_or_else(|| ErrorMessage::Static(DEFAULT_ERROR_MESSAGE.to_string())),
            error_factory: layer.error_factory.unwrap_or_else(|| {
                Arc::new(|message: String, failures: FailureSet| {
                    E::from(BadRequest::new(message, failures))
                })
            }),
            max_errors_per_field: layer.max_errors_per_field.unwrap_or(DEFAULT_MAX_ERRORS_PER_FIELD),
        };

        options.validate()?;
        Ok(options)
    }
}

impl<E> Options<E> {
    fn validate(&self) -> Result<(), OptionsError> {
        if self.raw_name.is_empty() {
            return Err(OptionsError::EmptyName { option: "raw_name" });
        }
        if self.name.is_empty() {
            return Err(OptionsError::EmptyName { option: "name" });
        }
        if self.max_errors_per_field == 0 {
            return Err(OptionsError::ZeroErrorCap);
        }
        Ok(())
    }

    /// Context slot for raw parameters.
    #[must_use]
    pub fn raw_name(&self) -> &str {
        &self.raw_name
    }

    /// Context slot for transformed parameters.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The rejection message.
    #[must_use]
    pub fn error_message(&self) -> &ErrorMessage {
        &self.error_message
    }

    /// Builds the forwarded error for a validation failure.
    pub fn make_error(&self, message: String, failures: FailureSet) -> E {
        (self.error_factory)(message, failures)
    }

    /// Cap on failures recorded per field.
    #[must_use]
    pub fn max_errors_per_field(&self) -> usize {
        self.max_errors_per_field
    }
}

impl<E> fmt::Debug for Options<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("raw_name", &self.raw_name)
            .field("name", &self.name)
            .field("error_message", &self.error_message)
            .field("max_errors_per_field", &self.max_errors_per_field)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqparams_core::RuleFailure;
    use reqparams_extract::ExtractionContextBuilder;

    fn resolve(defaults: OptionOverrides, call_site: OptionOverrides) -> Result<Options, OptionsError> {
        Options::resolve(&defaults, &call_site)
    }

    #[test]
    fn test_builtin_defaults() {
        let options = resolve(OptionOverrides::new(), OptionOverrides::new()).unwrap();
        let request = ExtractionContextBuilder::new().build();

        assert_eq!(options.raw_name(), "rawParameters");
        assert_eq!(options.name(), "parameters");
        assert_eq!(options.error_message().render(&request), "Bad Request");
        assert_eq!(options.max_errors_per_field(), 1);

        let mut failures = FailureSet::new();
        failures.add("name", RuleFailure::new("required", "name is required"));
        let error = options.make_error("Bad Request".into(), failures);
        assert_eq!(error.status, 400);
        assert!(error.errors.contains("name"));
    }

    #[test]
    fn test_call_site_beats_defaults_beats_builtin() {
        let defaults = OptionOverrides::new()
            .raw_name("raw")
            .name("params")
            .max_errors_per_field(3);
        let call_site = OptionOverrides::new().name("book");

        let options = resolve(defaults, call_site).unwrap();
        assert_eq!(options.raw_name(), "raw");
        assert_eq!(options.name(), "book");
        assert_eq!(options.max_errors_per_field(), 3);
    }

    #[test]
    fn test_dynamic_message_sees_request() {
        let call_site = OptionOverrides::new().dynamic_error_message(|request| format!("Bad {}", request.path()));
        let options = resolve(OptionOverrides::new(), call_site).unwrap();

        let request = ExtractionContextBuilder::new()
            .uri(http::Uri::from_static("/books"))
            .build();
        assert_eq!(options.error_message().render(&request), "Bad /books");
    }

    #[test]
    fn test_custom_factory() {
        #[derive(Debug)]
        struct Teapot(String);

        impl From<BadRequest> for Teapot {
            fn from(error: BadRequest) -> Self {
                Self(error.message)
            }
        }

        let defaults: OptionOverrides<Teapot> =
            OptionOverrides::new().error_factory(|message, _| Teapot(format!("teapot: {message}")));
        let options = Options::resolve(&defaults, &OptionOverrides::new()).unwrap();
        assert_eq!(options.make_error("nope".into(), FailureSet::new()).0, "teapot: nope");

        let options: Options<Teapot> = Options::resolve(&OptionOverrides::new(), &OptionOverrides::new()).unwrap();
        assert_eq!(options.make_error("plain".into(), FailureSet::new()).0, "plain");
    }

    #[test]
    fn test_rejects_invalid_options() {
        assert_eq!(
            resolve(OptionOverrides::new().name(""), OptionOverrides::new()).unwrap_err(),
            OptionsError::EmptyName { option: "name" }
        );
        assert_eq!(
            resolve(OptionOverrides::new(), OptionOverrides::new().raw_name("")).unwrap_err(),
            OptionsError::EmptyName { option: "raw_name" }
        );
        assert_eq!(
            resolve(OptionOverrides::new(), OptionOverrides::new().max_errors_per_field(0)).unwrap_err(),
            OptionsError::ZeroErrorCap
        );
    }

    #[test]
    fn test_merge_and_is_empty() {
        let base: OptionOverrides = OptionOverrides::new().name("a").error_message("x");
        assert!(!base.is_empty());
        assert!(OptionOverrides::<BadRequest>::new().is_empty());

        let merged = base.merge(OptionOverrides::new().name("b"));
        let options = resolve(merged, OptionOverrides::new()).unwrap();
        assert_eq!(options.name(), "b");
        assert!(matches!(options.error_message(), ErrorMessage::Static(m) if m == "x"));
    }
}
