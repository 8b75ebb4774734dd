//! # Reqparams Middleware
//!
//! Request parameter normalization as a middleware stage.
//!
//! Every request handled by a [`ParametersMiddleware`] goes through:
//!
//! ```text
//! query ─┐
//! body  ─┼─ merge ─→ rawParameters ─→ defaults → filter → validate → project ─→ parameters
//! path  ─┘                                                   │
//!                                                            └─ failure ─→ translate ─→ 400 / forwarded
//! ```
//!
//! ## Key Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`ParametersFactory`] | Holds process-wide defaults and the rule evaluator |
//! | [`Parameters`] | A handler for one schema; `handle` is the per-request entry point |
//! | [`ParametersMiddleware`] | [`Parameters`] as a chain stage |
//! | [`OptionOverrides`] / [`Options`] | Layered options |
//! | [`Failure`] | `Rejected(E)` for validation failures, `Unexpected` for everything else |
//! | [`BadRequest`] | The default rejection: `{ message, status: 400, errors }` |
//! | [`Chain`] | Ordered middleware chain |
//!
//! ## Example
//!
//! ```
//! use reqparams_middleware::{Chain, MiddlewareContext, OptionOverrides, ParametersFactory, Response, ResponseExt};
//! use bytes::Bytes;
//! use http::StatusCode;
//! use http_body_util::Full;
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let books = ParametersFactory::new()
//!     .create(
//!         json!({ "name": { "$validate": { "required": true, "string": true } } }),
//!         OptionOverrides::new(),
//!     )
//!     .unwrap();
//!
//! let chain = Chain::builder().with(books.into_middleware()).build();
//!
//! let request = http::Request::builder()
//!     .uri("/books?name=Tom&admin=1")
//!     .body(Full::new(Bytes::new()))
//!     .unwrap();
//!
//! let mut ctx = MiddlewareContext::new();
//! let response = chain
//!     .run(&mut ctx, request, |_ctx, _req| Box::pin(async { Response::json(StatusCode::OK, "ok") }))
//!     .await;
//!
//! assert_eq!(response.status(), StatusCode::OK);
//! assert_eq!(ctx.value("parameters"), Some(&json!({ "name": "Tom" })));
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/reqparams-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod chain;
pub mod context;
pub mod middleware;
pub mod options;
pub mod parameters;
pub mod request_id;
pub mod translate;
pub mod types;

// Re-export main types at crate root
pub use chain::{BoxedMiddleware, Chain, ChainBuilder};
pub use context::{ContextError, MiddlewareContext, RequestId};
pub use middleware::{BoxFuture, FnMiddleware, Middleware, Next};
pub use options::{
    ErrorFactory, ErrorMessage, MessageFn, OptionOverrides, Options, OptionsError, DEFAULT_ERROR_MESSAGE,
    DEFAULT_NAME, DEFAULT_RAW_NAME,
};
pub use parameters::{BuildError, Parameters, ParametersFactory, ParametersMiddleware};
pub use request_id::{RequestIdMiddleware, REQUEST_ID_HEADER};
pub use translate::{translate, BadRequest, Failure, IntoErrorResponse};
pub use types::{Request, Response, ResponseExt};
