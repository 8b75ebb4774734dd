//! # reqparams
//!
//! **Declarative request parameter normalization for HTTP services**
//!
//! Declare once, per route, which parameters a request may carry; every
//! request is then:
//!
//! - **Merged**: query, body and path parameters become one object (path
//!   beats body, body beats query)
//! - **Defaulted**: absent fields get their declared defaults
//! - **Filtered**: undeclared fields are dropped
//! - **Validated**: declared rules run, failures are collected per field
//! - **Projected**: internal-only fields are removed from the output
//!
//! Validation failures become a configurable error (a 400 `BadRequest` by
//! default); anything else is forwarded untouched.
//!
//! ## Quick Start
//!
//! ```
//! use reqparams::prelude::*;
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let books = ParametersFactory::new()
//!     .create(
//!         json!({
//!             "name":  { "$validate": { "required": true, "string": true } },
//!             "limit": { "$default": 20, "$validate": { "integer": true, "max": 100 } }
//!         }),
//!         OptionOverrides::new(),
//!     )
//!     .unwrap();
//!
//! let request = ExtractionContextBuilder::new()
//!     .uri(http::Uri::from_static("/books?name=Dune&admin=1"))
//!     .build();
//!
//! let mut ctx = MiddlewareContext::new();
//! books.handle(&mut ctx, &request).await.unwrap();
//! assert_eq!(ctx.value("parameters"), Some(&json!({ "name": "Dune", "limit": 20 })));
//! # });
//! ```
//!
//! ## Architecture
//!
//! ```text
//! reqparams-extract   query / body / path  →  ParameterSources
//! reqparams-core      merge → defaults → filter → validate → project
//! reqparams-middleware options, error translation, chain stage
//! reqparams-config    [parameters] / [logging] from file and env
//! reqparams-telemetry tracing-subscriber setup
//! ```

#![doc(html_root_url = "https://docs.rs/reqparams/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export the transformation pipeline
pub use reqparams_core as pipeline;

// Re-export extraction types
pub use reqparams_extract as extract;

// Re-export middleware types
pub use reqparams_middleware as middleware;

// Re-export configuration types
pub use reqparams_config as config;

// Re-export logging setup
pub use reqparams_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// ```
/// use reqparams::prelude::*;
/// ```
pub mod prelude {
    pub use reqparams_core::{
        FailureSet, FieldSpec, FnRule, PipelineError, RuleCheck, RuleEvaluator, RuleFailure, RuleOutcome,
        RuleRegistry, Schema, SchemaError, SchemaSource, StandardRules, UnexpectedError,
    };

    pub use reqparams_extract::{ExtractionContext, ExtractionContextBuilder, ExtractionError, PathParams};

    pub use reqparams_middleware::{
        BadRequest, Chain, Failure, IntoErrorResponse, Middleware, MiddlewareContext, OptionOverrides,
        Parameters, ParametersFactory, ParametersMiddleware, RequestIdMiddleware,
    };

    pub use reqparams_config::{ConfigLoader, ParametersConfig};

    pub use reqparams_telemetry::{init_logging, LogConfig};
}
