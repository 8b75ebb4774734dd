//! The parameters handler and its middleware adapter.
//!
//! ## Per-request flow
//!
//! 1. Collect query, body and path parameters and merge them
//! 2. Store the merged object under the raw name
//! 3. Resolve the schema (fixed, or selected from the request)
//! 4. Run defaults, filter, validate, project
//! 5. On success store the output under the name; on failure translate
//!
//! Step 2 happens before anything can fail validation, so the raw
//! parameters are visible to error handlers even for rejected requests.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::options::{OptionOverrides, Options, OptionsError};
use crate::translate::{translate, BadRequest, Failure, IntoErrorResponse};
use crate::types::{Request, Response};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use reqparams_core::{
    RuleEvaluator, SchemaError, SchemaSource, StandardRules, Transformer, UnexpectedError,
};
use reqparams_extract::{ExtractionContext, ParameterCollector};
use serde_json::Value;
use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

/// Errors raised when building a handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// The schema argument is malformed.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The resolved options are invalid.
    #[error(transparent)]
    Options(#[from] OptionsError),
}

impl From<Infallible> for BuildError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

/// Creates parameter handlers that share process-wide defaults.
///
/// The factory holds the defaults layer and the rule evaluator; every
/// handler it creates resolves its own options against them once, at
/// creation time.
///
/// # Example
///
/// ```
/// use reqparams_middleware::{OptionOverrides, ParametersFactory};
/// use serde_json::json;
///
/// let factory = ParametersFactory::new()
///     .with_defaults(OptionOverrides::new().error_message("Invalid request"));
///
/// let books = factory
///     .create(
///         json!({ "name": { "$validate": { "required": true, "string": true } } }),
///         OptionOverrides::new().name("book"),
///     )
///     .unwrap();
/// assert_eq!(books.options().name(), "book");
///
/// // Anything but an object (or a selector) is refused up front
/// assert!(factory.create(json!(null), OptionOverrides::new()).is_err());
/// ```
pub struct ParametersFactory<E = BadRequest> {
    defaults: OptionOverrides<E>,
    evaluator: Arc<dyn RuleEvaluator>,
    collector: ParameterCollector,
}

impl ParametersFactory<BadRequest> {
    /// Creates a factory producing [`BadRequest`] rejections.
    #[must_use]
    pub fn new() -> Self {
        Self::with_error_type()
    }
}

impl Default for ParametersFactory<BadRequest> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> ParametersFactory<E>
where
    E: From<BadRequest> + Send + Sync + 'static,
{
    /// Creates a factory for a custom rejection type.
    #[must_use]
    pub fn with_error_type() -> Self {
        Self {
            defaults: OptionOverrides::new(),
            evaluator: Arc::new(StandardRules),
            collector: ParameterCollector::new(),
        }
    }

    /// Replaces the process-wide defaults layer.
    #[must_use]
    pub fn with_defaults(mut self, defaults: OptionOverrides<E>) -> Self {
        self.defaults = defaults;
        self
    }

    /// Replaces the rule evaluator.
    #[must_use]
    pub fn with_evaluator(mut self, evaluator: impl RuleEvaluator + 'static) -> Self {
        self.evaluator = Arc::new(evaluator);
        self
    }

    /// Replaces the parameter collector (e.g. to change the body limit).
    #[must_use]
    pub fn with_collector(mut self, collector: ParameterCollector) -> Self {
        self.collector = collector;
        self
    }

    /// Returns the defaults layer.
    #[must_use]
    pub fn defaults(&self) -> &OptionOverrides<E> {
        &self.defaults
    }

    /// Builds a handler for a schema.
    ///
    /// `schema` may be a [`Schema`](reqparams_core::Schema), a
    /// [`SchemaSource`], or a JSON schema document.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Schema`] if the schema is not an object (or a
    /// selector) or is malformed, and [`BuildError::Options`] if the
    /// resolved options are invalid.
    pub fn create<S>(&self, schema: S, overrides: OptionOverrides<E>) -> Result<Parameters<E>, BuildError>
    where
        S: TryInto<SchemaSource<ExtractionContext>>,
        BuildError: From<S::Error>,
    {
        let schema = schema.try_into()?;
        let options = Options::resolve(&self.defaults, &overrides)?;

        Ok(Parameters {
            schema,
            options: Arc::new(options),
            evaluator: Arc::clone(&self.evaluator),
            collector: self.collector,
        })
    }
}

impl<E> fmt::Debug for ParametersFactory<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParametersFactory")
            .field("defaults", &self.defaults)
            .field("collector", &self.collector)
            .finish_non_exhaustive()
    }
}

/// A per-schema parameters handler.
///
/// Cheap to share: wrap it in an `Arc` or use [`Parameters::into_middleware`].
pub struct Parameters<E = BadRequest> {
    schema: SchemaSource<ExtractionContext>,
    options: Arc<Options<E>>,
    evaluator: Arc<dyn RuleEvaluator>,
    collector: ParameterCollector,
}

impl<E> Parameters<E> {
    /// Returns the resolved options.
    #[must_use]
    pub fn options(&self) -> &Options<E> {
        &self.options
    }

    /// Returns the schema source.
    #[must_use]
    pub fn schema(&self) -> &SchemaSource<ExtractionContext> {
        &self.schema
    }

    /// Handles one request.
    ///
    /// `Ok(())` means the transformed parameters are stored under the
    /// configured name and the request may continue. The merged raw
    /// parameters are stored under the raw name whenever the sources could
    /// be parsed, whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`Failure::Rejected`] with the factory-built error when
    /// validation fails, and [`Failure::Unexpected`] for anything else.
    pub async fn handle(&self, ctx: &mut MiddlewareContext, request: &ExtractionContext) -> Result<(), Failure<E>> {
        let request_id = ctx.request_id();

        let merged = self
            .collector
            .collect(request)
            .map_err(|e| {
                error!(request_id = %request_id, error = %e, "failed to collect parameters");
                Failure::Unexpected(UnexpectedError::other(e))
            })?
            .merge();
        ctx.set_value(self.options.raw_name(), Value::Object(merged.clone()));

        let schema = self.schema.resolve(request).map_err(|e| {
            error!(request_id = %request_id, error = %e, "schema resolution failed");
            Failure::Unexpected(UnexpectedError::from(e))
        })?;
        debug!(
            request_id = %request_id,
            fields = schema.len(),
            dynamic = self.schema.is_dynamic(),
            "schema resolved"
        );

        let result = Transformer::new(&schema, self.evaluator.as_ref())
            .max_errors_per_field(self.options.max_errors_per_field())
            .run(merged)
            .await;

        match result {
            Ok(output) => {
                debug!(
                    request_id = %request_id,
                    fields = output.len(),
                    elapsed_us = ctx.elapsed().as_micros(),
                    "parameters accepted"
                );
                ctx.set_value(self.options.name(), Value::Object(output));
                Ok(())
            }
            Err(err) => {
                match err.failures() {
                    Some(failures) => info!(
                        request_id = %request_id,
                        count = failures.len(),
                        fields = ?failures.field_names().collect::<Vec<_>>(),
                        elapsed_us = ctx.elapsed().as_micros(),
                        "parameters rejected"
                    ),
                    None => error!(request_id = %request_id, error = %err, "parameter processing failed"),
                }
                Err(translate(err, request, &self.options))
            }
        }
    }

    /// Wraps this handler as a chain [`Middleware`].
    #[must_use]
    pub fn into_middleware(self) -> ParametersMiddleware<E> {
        ParametersMiddleware {
            parameters: Arc::new(self),
        }
    }
}

impl<E> fmt::Debug for Parameters<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parameters")
            .field("schema", &self.schema)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// [`Parameters`] as a chain stage.
///
/// On success the request continues down the chain. On failure the
/// [`Failure`] is stored as a context extension and the chain is
/// short-circuited with [`IntoErrorResponse::to_error_response`].
pub struct ParametersMiddleware<E = BadRequest> {
    parameters: Arc<Parameters<E>>,
}

impl<E> ParametersMiddleware<E> {
    /// Creates the middleware from a shared handler.
    #[must_use]
    pub fn new(parameters: Arc<Parameters<E>>) -> Self {
        Self { parameters }
    }
}

impl<E> Clone for ParametersMiddleware<E> {
    fn clone(&self) -> Self {
        Self {
            parameters: Arc::clone(&self.parameters),
        }
    }
}

impl<E> Middleware for ParametersMiddleware<E>
where
    E: IntoErrorResponse + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        "parameters"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let (parts, body) = request.into_parts();
            let body: Bytes = match body.collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(never) => match never {},
            };

            let view = ExtractionContext::from_parts(&parts, body.clone());
            match self.parameters.handle(ctx, &view).await {
                Ok(()) => next.run(ctx, Request::from_parts(parts, Full::new(body))).await,
                Err(failure) => {
                    let response = failure.to_error_response();
                    ctx.set_extension(failure);
                    response
                }
            }
        })
    }
}
