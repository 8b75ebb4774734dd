//! # Reqparams Core
//!
//! Schema model and transformation pipeline for request parameter
//! normalization.
//!
//! This crate is framework-agnostic. It knows nothing about HTTP; it turns a
//! merged parameter object into a validated, schema-shaped one:
//!
//! - [`Schema`] / [`FieldSpec`] - Declarative field rules, parsed from a JSON document or built in code
//! - [`SchemaSource`] - A fixed schema or a per-request selector
//! - [`ParameterSources`] - Query, body and path parameters merged in precedence order
//! - [`Transformer`] - Defaults, filter, validate, project
//! - [`RuleEvaluator`] - The async rule capability, with [`StandardRules`] and [`RuleRegistry`]
//! - [`FailureSet`] / [`UnexpectedError`] - The two failure kinds of a run
//!
//! ## Example
//!
//! ```
//! use reqparams_core::{ParameterSources, Schema, StandardRules, Transformer};
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let schema = Schema::from_value(&json!({
//!     "name": { "$validate": { "required": true, "string": true } }
//! }))?;
//!
//! let merged = ParameterSources::new(
//!     json!({ "name": "Tom", "debug": "1" }).as_object().cloned().unwrap_or_default(),
//!     Default::default(),
//!     Default::default(),
//! )
//! .merge();
//!
//! let output = Transformer::new(&schema, &StandardRules).run(merged).await?;
//! assert_eq!(serde_json::Value::Object(output), json!({ "name": "Tom" }));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! # }).unwrap();
//! ```

#![doc(html_root_url = "https://docs.rs/reqparams-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub mod merge;
mod pipeline;
pub mod rules;
mod schema;
mod source;

pub use error::{
    json_kind, FailureSet, PipelineError, PipelineResult, RuleFailure, SchemaError, UnexpectedError,
};
pub use merge::{deep_merge, ParameterSources, Params};
pub use pipeline::{Transformer, DEFAULT_MAX_ERRORS_PER_FIELD};
pub use rules::{FnRule, RuleCheck, RuleEvaluator, RuleOutcome, RuleRegistry, StandardRules};
pub use schema::{FieldSpec, Schema, SchemaBuilder};
pub use source::{SchemaSelector, SchemaSource};
