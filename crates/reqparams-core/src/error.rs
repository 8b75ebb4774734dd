//! Error types for the transformation pipeline.
//!
//! Three kinds of failure exist and they are never conflated:
//!
//! | Type | When | Handling |
//! |------|------|----------|
//! | [`SchemaError`] | A schema document has the wrong shape | Fatal at setup time |
//! | [`FailureSet`] | One or more fields failed their rules | Translated for the client |
//! | [`UnexpectedError`] | A rule evaluator broke, a schema was malformed at request time | Passed through untouched |
//!
//! [`PipelineError`] is the failure side of a pipeline run and carries
//! either a [`FailureSet`] or an [`UnexpectedError`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Result type alias for pipeline runs.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors raised while building a [`Schema`](crate::Schema) from a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The schema argument is neither an object nor a selector function.
    #[error("schema must be either plain object or function returning a schema object, got {found}")]
    InvalidShape {
        /// JSON kind that was supplied instead.
        found: &'static str,
    },

    /// A field specification is not an object (or `true`).
    #[error("field '{field}': specification must be an object or `true`, got {found}")]
    InvalidField {
        /// The offending field.
        field: String,
        /// JSON kind that was supplied instead.
        found: &'static str,
    },

    /// A directive carries a value of the wrong type.
    #[error("field '{field}': `{directive}` must be {expected}")]
    InvalidDirective {
        /// The offending field.
        field: String,
        /// The directive name (e.g. `$validate`).
        directive: String,
        /// Description of the accepted value.
        expected: &'static str,
    },

    /// A field specification uses a directive this crate does not know.
    #[error("field '{field}': unknown directive `{directive}`")]
    UnknownDirective {
        /// The offending field.
        field: String,
        /// The unknown directive name.
        directive: String,
    },

    /// A top-level `$`-key other than `$passthrough`.
    #[error("unknown schema directive `{directive}`")]
    UnknownSchemaDirective {
        /// The unknown directive name.
        directive: String,
    },
}

/// Returns a short name for the kind of a JSON value, used in error messages.
#[must_use]
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A single rule failure for a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleFailure {
    /// Name of the rule that failed (e.g. `required`).
    pub rule: String,
    /// Human-readable failure message.
    pub message: String,
}

impl RuleFailure {
    /// Creates a new rule failure.
    #[must_use]
    pub fn new(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            message: message.into(),
        }
    }
}

/// Field-keyed collection of rule failures.
///
/// Fields appear in schema declaration order; failures within a field
/// appear in rule declaration order. Serializes as a plain map:
///
/// ```json
/// { "name": [ { "rule": "required", "message": "name is required" } ] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FailureSet {
    fields: IndexMap<String, Vec<RuleFailure>>,
}

impl FailureSet {
    /// Creates an empty failure set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failure for a field.
    pub fn add(&mut self, field: impl Into<String>, failure: RuleFailure) {
        self.fields.entry(field.into()).or_default().push(failure);
    }

    /// Returns the failures recorded for a field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&[RuleFailure]> {
        self.fields.get(field).map(Vec::as_slice)
    }

    /// Returns `true` if a failure was recorded for the field.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Returns `true` if no field failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the number of failing fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Iterates over failing field names.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Iterates over `(field, failures)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[RuleFailure])> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

/// A failure that is not a user input problem.
///
/// These are bugs or misconfigurations. They are forwarded to the host
/// error channel exactly as produced, never rewritten into a client error.
#[derive(Debug, Error)]
pub enum UnexpectedError {
    /// A schema resolved at request time was malformed.
    #[error("malformed schema: {0}")]
    Schema(#[from] SchemaError),

    /// The schema references a rule no evaluator understands.
    #[error("unknown validation rule '{rule}' on field '{field}'")]
    UnknownRule {
        /// Field carrying the rule.
        field: String,
        /// The unknown rule.
        rule: String,
    },

    /// A rule carries a configuration value it cannot use.
    #[error("invalid configuration for rule '{rule}' on field '{field}': {reason}")]
    InvalidRuleConfig {
        /// Field carrying the rule.
        field: String,
        /// The misconfigured rule.
        rule: String,
        /// Why the configuration was rejected.
        reason: String,
    },

    /// A rule evaluator failed while checking a value.
    #[error("rule '{rule}' failed to evaluate on field '{field}'")]
    Evaluator {
        /// Field carrying the rule.
        field: String,
        /// The rule being evaluated.
        rule: String,
        /// The underlying error.
        #[source]
        source: anyhow::Error,
    },

    /// Any other failure while collecting or processing parameters.
    #[error("{message}")]
    Other {
        /// Human-readable description.
        message: String,
        /// The underlying error.
        #[source]
        source: anyhow::Error,
    },
}

impl UnexpectedError {
    /// Wraps an evaluator failure.
    #[must_use]
    pub fn evaluator(
        field: impl Into<String>,
        rule: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Evaluator {
            field: field.into(),
            rule: rule.into(),
            source: source.into(),
        }
    }

    /// Wraps an arbitrary error, keeping it reachable through `source()`.
    #[must_use]
    pub fn other<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Other {
            message: error.to_string(),
            source: anyhow::Error::new(error),
        }
    }

    /// Returns the wrapped error of an [`UnexpectedError::Other`] as `E`, if it is one.
    #[must_use]
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: std::fmt::Display + std::fmt::Debug + Send + Sync + 'static,
    {
        match self {
            Self::Other { source, .. } | Self::Evaluator { source, .. } => source.downcast_ref(),
            _ => None,
        }
    }
}

/// The failure side of a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// One or more fields failed validation.
    #[error("validation failed for {} field(s)", .0.len())]
    Validation(FailureSet),

    /// Something other than user input went wrong.
    #[error(transparent)]
    Unexpected(#[from] UnexpectedError),
}

impl PipelineError {
    /// Returns the failure set if this is a validation failure.
    #[must_use]
    pub fn failures(&self) -> Option<&FailureSet> {
        match self {
            Self::Validation(failures) => Some(failures),
            Self::Unexpected(_) => None,
        }
    }

    /// Returns `true` for validation failures.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
