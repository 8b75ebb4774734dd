//! Core extractor trait.

use crate::{ExtractionContext, ExtractionError};

/// Types that can be built from a request view.
///
/// # Example
///
/// ```rust
/// use reqparams_extract::{ExtractionContext, ExtractionError, ExtractionSource, FromRequest};
///
/// struct Locale(String);
///
/// impl FromRequest for Locale {
///     fn from_request(ctx: &ExtractionContext) -> Result<Self, ExtractionError> {
///         let value = ctx.header("accept-language").unwrap_or("en");
///         if value.is_empty() {
///             return Err(ExtractionError::malformed(ExtractionSource::Header, "empty locale"));
///         }
///         Ok(Locale(value.to_string()))
///     }
/// }
/// ```
pub trait FromRequest: Sized {
    /// Extracts this type from the request context.
    ///
    /// # Errors
    ///
    /// Returns an [`ExtractionError`] if extraction fails.
    fn from_request(ctx: &ExtractionContext) -> Result<Self, ExtractionError>;
}
