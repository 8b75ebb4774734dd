//! Rule evaluation.
//!
//! The pipeline does not know what any rule means. It hands every
//! `(field, rule, config, value)` tuple to a [`RuleEvaluator`] and records
//! the outcome. [`StandardRules`] covers the common checks; [`RuleRegistry`]
//! layers custom, possibly asynchronous, rules on top of it.
//!
//! # Standard rules
//!
//! | Rule | Config | Passes when |
//! |------|--------|-------------|
//! | `required` | bool | value present, not null, not `""` |
//! | `string` / `number` / `integer` / `boolean` / `array` / `object` | bool | value has that JSON type |
//! | `min` / `max` | number | numeric value within bound |
//! | `minLength` / `maxLength` | integer | string chars / array items within bound |
//! | `pattern` | regex string | string matches |
//! | `in` | array | value is one of the listed values |
//! | `sameAs` | field name | value equals that field's value |
//!
//! Every rule except `required` passes on absent or null values. A bad
//! configuration is reported whether or not the value is present.

use crate::error::UnexpectedError;
use crate::merge::Params;
use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// One rule applied to one field.
#[derive(Debug, Clone, Copy)]
pub struct RuleCheck<'a> {
    /// Field being checked.
    pub field: &'a str,
    /// Rule name.
    pub rule: &'a str,
    /// Rule configuration from the schema.
    pub config: &'a Value,
    /// Current field value; `None` when absent.
    pub value: Option<&'a Value>,
    /// The whole working parameter set, for cross-field rules.
    pub params: &'a Params,
}

/// Outcome of a rule check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutcome {
    /// The value satisfies the rule.
    Pass,
    /// The value violates the rule.
    Fail(String),
}

impl RuleOutcome {
    /// Creates a failing outcome.
    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self::Fail(message.into())
    }

    /// Returns `true` for [`RuleOutcome::Pass`].
    #[must_use]
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

/// The rule evaluation capability the pipeline calls per field.
///
/// Implementations may suspend (e.g. a uniqueness lookup against a store).
/// A returned `Err` aborts the pipeline as an unexpected failure; a
/// [`RuleOutcome::Fail`] is a normal validation failure.
#[async_trait]
pub trait RuleEvaluator: Send + Sync {
    /// Evaluates a single rule.
    async fn evaluate<'a>(&self, check: RuleCheck<'a>) -> Result<RuleOutcome, UnexpectedError>;
}

#[async_trait]
impl<T: RuleEvaluator + ?Sized> RuleEvaluator for Arc<T> {
    async fn evaluate<'a>(&self, check: RuleCheck<'a>) -> Result<RuleOutcome, UnexpectedError> {
        (**self).evaluate(check).await
    }
}

/// The built-in rule set.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardRules;

impl StandardRules {
    /// Creates the standard rule set.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Returns `true` if this rule set knows the rule.
    #[must_use]
    pub fn supports(rule: &str) -> bool {
        matches!(
            rule,
            "required"
                | "string"
                | "number"
                | "integer"
                | "boolean"
                | "array"
                | "object"
                | "min"
                | "max"
                | "minLength"
                | "maxLength"
                | "pattern"
                | "in"
                | "sameAs"
        )
    }

    /// Evaluates a rule synchronously.
    ///
    /// The configuration is checked before the value is looked at, so a
    /// misconfigured rule fails even when the field is absent.
    pub fn check(&self, check: &RuleCheck<'_>) -> Result<RuleOutcome, UnexpectedError> {
        if check.rule == "required" {
            let required = config_bool(check)?;
            let missing = matches!(check.value, None | Some(Value::Null))
                || check.value.and_then(Value::as_str).is_some_and(str::is_empty);
            return Ok(if required && missing {
                RuleOutcome::fail(format!("{} is required", check.field))
            } else {
                RuleOutcome::Pass
            });
        }

        let rule = Configured::parse(check)?;
        Ok(match check.value {
            None | Some(Value::Null) => RuleOutcome::Pass,
            Some(value) => rule.evaluate(check, value),
        })
    }
}

/// A standard rule other than `required`, with its configuration parsed.
enum Configured<'a> {
    Type {
        enabled: bool,
        expected: &'static str,
        matches: fn(&Value) -> bool,
    },
    Min(f64),
    Max(f64),
    MinLength(usize),
    MaxLength(usize),
    Pattern { source: &'a str, regex: Regex },
    In(&'a [Value]),
    SameAs(&'a str),
}

impl<'a> Configured<'a> {
    fn parse(check: &RuleCheck<'a>) -> Result<Self, UnexpectedError> {
        match check.rule {
            "string" => Self::type_rule(check, "a string", Value::is_string),
            "number" => Self::type_rule(check, "a number", Value::is_number),
            "integer" => Self::type_rule(check, "an integer", |v| v.is_i64() || v.is_u64()),
            "boolean" => Self::type_rule(check, "a boolean", Value::is_boolean),
            "array" => Self::type_rule(check, "an array", Value::is_array),
            "object" => Self::type_rule(check, "an object", Value::is_object),
            "min" => config_number(check).map(Self::Min),
            "max" => config_number(check).map(Self::Max),
            "minLength" => config_length(check).map(Self::MinLength),
            "maxLength" => config_length(check).map(Self::MaxLength),
            "pattern" => {
                let source = check
                    .config
                    .as_str()
                    .ok_or_else(|| invalid_config(check, "expected a regular expression string"))?;
                let regex = Regex::new(source).map_err(|e| invalid_config(check, e.to_string()))?;
                Ok(Self::Pattern { source, regex })
            }
            "in" => check
                .config
                .as_array()
                .map(|allowed| Self::In(allowed.as_slice()))
                .ok_or_else(|| invalid_config(check, "expected an array of allowed values")),
            "sameAs" => check
                .config
                .as_str()
                .map(Self::SameAs)
                .ok_or_else(|| invalid_config(check, "expected a field name")),
            _ => Err(unknown_rule(check)),
        }
    }

    fn type_rule(
        check: &RuleCheck<'_>,
        expected: &'static str,
        matches: fn(&Value) -> bool,
    ) -> Result<Self, UnexpectedError> {
        Ok(Self::Type {
            enabled: config_bool(check)?,
            expected,
            matches,
        })
    }

    fn evaluate(&self, check: &RuleCheck<'_>, value: &Value) -> RuleOutcome {
        let field = check.field;
        match self {
            Self::Type {
                enabled,
                expected,
                matches,
            } => {
                if !enabled || matches(value) {
                    RuleOutcome::Pass
                } else {
                    RuleOutcome::fail(format!("{field} must be {expected}"))
                }
            }
            Self::Min(bound) => match value.as_f64() {
                Some(n) if n >= *bound => RuleOutcome::Pass,
                Some(_) => RuleOutcome::fail(format!("{field} must be at least {}", check.config)),
                None => RuleOutcome::fail(format!("{field} must be a number")),
            },
            Self::Max(bound) => match value.as_f64() {
                Some(n) if n <= *bound => RuleOutcome::Pass,
                Some(_) => RuleOutcome::fail(format!("{field} must be at most {}", check.config)),
                None => RuleOutcome::fail(format!("{field} must be a number")),
            },
            Self::MinLength(bound) => match length_of(value) {
                Some(len) if len >= *bound => RuleOutcome::Pass,
                Some(_) => RuleOutcome::fail(format!("{field} must have a length of at least {bound}")),
                None => RuleOutcome::fail(format!("{field} must be a string or an array")),
            },
            Self::MaxLength(bound) => match length_of(value) {
                Some(len) if len <= *bound => RuleOutcome::Pass,
                Some(_) => RuleOutcome::fail(format!("{field} must have a length of at most {bound}")),
                None => RuleOutcome::fail(format!("{field} must be a string or an array")),
            },
            Self::Pattern { source, regex } => match value.as_str() {
                Some(s) if regex.is_match(s) => RuleOutcome::Pass,
                Some(_) => RuleOutcome::fail(format!("{field} does not match the pattern {source}")),
                None => RuleOutcome::fail(format!("{field} must be a string")),
            },
            Self::In(allowed) => {
                if allowed.contains(value) {
                    RuleOutcome::Pass
                } else {
                    RuleOutcome::fail(format!("{field} must be one of {}", check.config))
                }
            }
            Self::SameAs(other) => {
                if check.params.get(*other) == Some(value) {
                    RuleOutcome::Pass
                } else {
                    RuleOutcome::fail(format!("{field} must match {other}"))
                }
            }
        }
    }
}

#[async_trait]
impl RuleEvaluator for StandardRules {
    async fn evaluate<'a>(&self, check: RuleCheck<'a>) -> Result<RuleOutcome, UnexpectedError> {
        self.check(&check)
    }
}

fn unknown_rule(check: &RuleCheck<'_>) -> UnexpectedError {
    UnexpectedError::UnknownRule {
        field: check.field.to_string(),
        rule: check.rule.to_string(),
    }
}

fn invalid_config(check: &RuleCheck<'_>, reason: impl Into<String>) -> UnexpectedError {
    UnexpectedError::InvalidRuleConfig {
        field: check.field.to_string(),
        rule: check.rule.to_string(),
        reason: reason.into(),
    }
}

fn config_bool(check: &RuleCheck<'_>) -> Result<bool, UnexpectedError> {
    check
        .config
        .as_bool()
        .ok_or_else(|| invalid_config(check, "expected a boolean"))
}

fn config_number(check: &RuleCheck<'_>) -> Result<f64, UnexpectedError> {
    check
        .config
        .as_f64()
        .ok_or_else(|| invalid_config(check, "expected a number"))
}

fn config_length(check: &RuleCheck<'_>) -> Result<usize, UnexpectedError> {
    check
        .config
        .as_u64()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| invalid_config(check, "expected a non-negative integer"))
}

fn length_of(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

/// A rule implemented by a synchronous function.
///
/// # Example
///
/// ```
/// use reqparams_core::rules::{FnRule, RuleOutcome};
///
/// let even = FnRule::new(|check| {
///     Ok(match check.value.and_then(|v| v.as_i64()) {
///         Some(n) if n % 2 != 0 => RuleOutcome::fail(format!("{} must be even", check.field)),
///         _ => RuleOutcome::Pass,
///     })
/// });
/// ```
pub struct FnRule<F> {
    func: F,
}

impl<F> FnRule<F>
where
    F: Fn(&RuleCheck<'_>) -> Result<RuleOutcome, UnexpectedError> + Send + Sync,
{
    /// Wraps a function as a rule.
    pub const fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<F> RuleEvaluator for FnRule<F>
where
    F: Fn(&RuleCheck<'_>) -> Result<RuleOutcome, UnexpectedError> + Send + Sync,
{
    async fn evaluate<'a>(&self, check: RuleCheck<'a>) -> Result<RuleOutcome, UnexpectedError> {
        (self.func)(&check)
    }
}

/// Named custom rules with a fallback evaluator.
///
/// Rules registered here shadow the fallback's rules of the same name.
///
/// # Example
///
/// ```
/// use reqparams_core::rules::{FnRule, RuleOutcome, RuleRegistry};
///
/// let rules = RuleRegistry::new()
///     .with_fn("slug", |check| {
///         let ok = check
///             .value
///             .and_then(|v| v.as_str())
///             .map_or(true, |s| s.chars().all(|c| c.is_ascii_lowercase() || c == '-'));
///         Ok(if ok {
///             RuleOutcome::Pass
///         } else {
///             RuleOutcome::fail(format!("{} must be a slug", check.field))
///         })
///     });
///
/// assert!(rules.contains("slug"));
/// ```
#[derive(Clone)]
pub struct RuleRegistry {
    rules: HashMap<String, Arc<dyn RuleEvaluator>>,
    fallback: Arc<dyn RuleEvaluator>,
}

impl RuleRegistry {
    /// Creates a registry that falls back to [`StandardRules`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_fallback(StandardRules)
    }

    /// Creates a registry with a custom fallback.
    #[must_use]
    pub fn with_fallback(fallback: impl RuleEvaluator + 'static) -> Self {
        Self {
            rules: HashMap::new(),
            fallback: Arc::new(fallback),
        }
    }

    /// Registers an evaluator under a rule name.
    #[must_use]
    pub fn with_rule(mut self, name: impl Into<String>, evaluator: impl RuleEvaluator + 'static) -> Self {
        self.rules.insert(name.into(), Arc::new(evaluator));
        self
    }

    /// Registers a synchronous function under a rule name.
    #[must_use]
    pub fn with_fn<F>(self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&RuleCheck<'_>) -> Result<RuleOutcome, UnexpectedError> + Send + Sync + 'static,
    {
        self.with_rule(name, FnRule::new(func))
    }

    /// Returns `true` if a custom rule with this name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.rules.keys().collect();
        names.sort();
        f.debug_struct("RuleRegistry").field("rules", &names).finish_non_exhaustive()
    }
}

#[async_trait]
impl RuleEvaluator for RuleRegistry {
    async fn evaluate<'a>(&self, check: RuleCheck<'a>) -> Result<RuleOutcome, UnexpectedError> {
        match self.rules.get(check.rule) {
            Some(evaluator) => evaluator.evaluate(check).await,
            None => self.fallback.evaluate(check).await,
        }
    }
}
