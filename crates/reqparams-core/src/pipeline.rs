//! The four-stage transformation pipeline.
//!
//! ## Stages
//!
//! 1. **Defaults** - fill absent declared fields from `$default`
//! 2. **Filter** - drop undeclared fields (unless passthrough) and excluded fields
//! 3. **Validate** - evaluate every field's rules in declaration order
//! 4. **Project** - drop internal-only fields from the output
//!
//! Each stage completes for every field before the next one starts. A
//! validation failure stops the run before projection.

use crate::error::{FailureSet, PipelineError, PipelineResult, RuleFailure};
use crate::merge::Params;
use crate::rules::{RuleCheck, RuleEvaluator, RuleOutcome};
use crate::schema::Schema;
use tracing::debug;

/// Default cap on failures recorded per field.
pub const DEFAULT_MAX_ERRORS_PER_FIELD: usize = 1;

/// Runs a schema over a parameter object.
///
/// # Example
///
/// ```
/// use reqparams_core::{FieldSpec, Schema, StandardRules, Transformer};
/// use serde_json::json;
///
/// # tokio_test::block_on(async {
/// let schema = Schema::builder()
///     .field("name", FieldSpec::new().required().rule("string", true))
///     .field("limit", FieldSpec::new().with_default(20))
///     .build();
///
/// let input = json!({ "name": "Tom", "admin": true });
/// let output = Transformer::new(&schema, &StandardRules)
///     .run(input.as_object().unwrap().clone())
///     .await
///     .unwrap();
///
/// assert_eq!(serde_json::Value::Object(output), json!({ "name": "Tom", "limit": 20 }));
/// # });
/// ```
pub struct Transformer<'a> {
    schema: &'a Schema,
    evaluator: &'a dyn RuleEvaluator,
    max_errors_per_field: usize,
}

impl<'a> Transformer<'a> {
    /// Creates a transformer for a schema and rule evaluator.
    #[must_use]
    pub fn new(schema: &'a Schema, evaluator: &'a dyn RuleEvaluator) -> Self {
        Self {
            schema,
            evaluator,
            max_errors_per_field: DEFAULT_MAX_ERRORS_PER_FIELD,
        }
    }

    /// Sets how many failures are recorded per field before its remaining
    /// rules are skipped. Values below 1 are treated as 1.
    #[must_use]
    pub fn max_errors_per_field(mut self, max: usize) -> Self {
        self.max_errors_per_field = max.max(1);
        self
    }

    /// Runs all four stages.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Validation`] when any field fails a rule and
    /// [`PipelineError::Unexpected`] when the evaluator itself fails.
    pub async fn run(&self, mut params: Params) -> PipelineResult<Params> {
        self.apply_defaults(&mut params);
        self.filter(&mut params);
        self.validate(&params).await?;
        self.project(&mut params);

        debug!(fields = params.len(), "parameters transformed");
        Ok(params)
    }

    /// Substitutes declared defaults for absent fields.
    ///
    /// A field present with a `null` value is not absent.
    pub fn apply_defaults(&self, params: &mut Params) {
        for (name, spec) in self.schema.fields() {
            if let Some(default) = spec.default_value() {
                if !params.contains_key(name) {
                    params.insert(name.to_string(), default.clone());
                }
            }
        }
    }

    /// Removes fields the schema does not let through.
    pub fn filter(&self, params: &mut Params) {
        let schema = self.schema;
        params.retain(|name, _| match schema.field(name) {
            Some(spec) => spec.is_included(),
            None => schema.is_passthrough(),
        });
    }

    /// Evaluates every rule of every field.
    ///
    /// Failures are collected for all fields; a single field stops after
    /// `max_errors_per_field` failures.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Validation`] with every failing field, or
    /// [`PipelineError::Unexpected`] as soon as the evaluator errors.
    pub async fn validate(&self, params: &Params) -> PipelineResult<()> {
        let mut failures = FailureSet::new();

        for (field, spec) in self.schema.fields() {
            if !spec.is_included() {
                continue;
            }

            let value = params.get(field);
            let mut count = 0;
            for (rule, config) in spec.rules() {
                let check = RuleCheck {
                    field,
                    rule,
                    config,
                    value,
                    params,
                };
                if let RuleOutcome::Fail(message) = self.evaluator.evaluate(check).await? {
                    failures.add(field, RuleFailure::new(rule, message));
                    count += 1;
                    if count >= self.max_errors_per_field {
                        break;
                    }
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            debug!(fields = failures.len(), "validation failed");
            Err(PipelineError::Validation(failures))
        }
    }

    /// Drops internal-only fields.
    pub fn project(&self, params: &mut Params) {
        let schema = self.schema;
        params.retain(|name, _| schema.field(name).map_or(true, |spec| spec.is_projected()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UnexpectedError;
    use crate::rules::{RuleRegistry, StandardRules};
    use crate::schema::FieldSpec;
    use async_trait::async_trait;
    use proptest::prelude::*;
    use serde_json::{json, Value};
    use std::time::Duration;

    fn object(value: Value) -> Params {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn book_schema() -> Schema {
        Schema::from_value(&json!({
            "name": { "$validate": { "required": true, "string": true } }
        }))
        .unwrap()
    }

    async fn run(schema: &Schema, input: Value) -> PipelineResult<Value> {
        Transformer::new(schema, &StandardRules)
            .run(object(input))
            .await
            .map(Value::Object)
    }

    #[tokio::test]
    async fn test_valid_input_passes_through() {
        let output = run(&book_schema(), json!({ "name": "Tom" })).await.unwrap();
        assert_eq!(output, json!({ "name": "Tom" }));
    }

    #[tokio::test]
    async fn test_unknown_fields_are_dropped() {
        let output = run(&book_schema(), json!({ "name": "Tom", "isAdmin": true }))
            .await
            .unwrap();
        assert_eq!(output, json!({ "name": "Tom" }));
    }

    #[tokio::test]
    async fn test_missing_required_field_fails() {
        let err = run(&book_schema(), json!({})).await.unwrap_err();
        let failures = err.failures().unwrap();
        assert!(failures.contains("name"));
        assert_eq!(failures.get("name").unwrap()[0].rule, "required");
    }

    #[tokio::test]
    async fn test_empty_string_fails_required() {
        let err = run(&book_schema(), json!({ "name": "" })).await.unwrap_err();
        assert!(err.failures().unwrap().contains("name"));
    }

    #[tokio::test]
    async fn test_defaults_fill_absent_but_not_null() {
        let schema = Schema::builder()
            .field("page", FieldSpec::new().with_default(1))
            .field("sort", FieldSpec::new().with_default("asc"))
            .build();

        let output = run(&schema, json!({ "sort": null })).await.unwrap();
        assert_eq!(output, json!({ "sort": null, "page": 1 }));
    }

    #[tokio::test]
    async fn test_default_satisfies_required() {
        let schema = Schema::builder()
            .field("limit", FieldSpec::new().with_default(25).required().rule("integer", true))
            .build();

        let output = run(&schema, json!({})).await.unwrap();
        assert_eq!(output, json!({ "limit": 25 }));
    }

    #[tokio::test]
    async fn test_excluded_fields_are_filtered_even_in_passthrough() {
        let schema = Schema::from_value(&json!({
            "$passthrough": true,
            "name": true,
            "secret": { "$filter": false }
        }))
        .unwrap();

        let output = run(&schema, json!({ "name": "Tom", "secret": "x", "extra": 1 }))
            .await
            .unwrap();
        assert_eq!(output, json!({ "name": "Tom", "extra": 1 }));
    }

    #[tokio::test]
    async fn test_internal_field_is_validated_then_projected_away() {
        let schema = Schema::from_value(&json!({
            "password": { "$validate": { "required": true, "minLength": 6 } },
            "confirm": { "$validate": { "sameAs": "password" }, "$project": false }
        }))
        .unwrap();

        let output = run(&schema, json!({ "password": "hunter2", "confirm": "hunter2" }))
            .await
            .unwrap();
        assert_eq!(output, json!({ "password": "hunter2" }));

        let err = run(&schema, json!({ "password": "hunter2", "confirm": "hunter3" }))
            .await
            .unwrap_err();
        assert!(err.failures().unwrap().contains("confirm"));
    }

    #[tokio::test]
    async fn test_failures_collected_for_all_fields() {
        let schema = Schema::builder()
            .field("a", FieldSpec::new().required())
            .field("b", FieldSpec::new().rule("integer", true))
            .field("c", FieldSpec::new().rule("string", true))
            .build();

        let err = run(&schema, json!({ "b": "x", "c": "ok" })).await.unwrap_err();
        let names: Vec<_> = err.failures().unwrap().field_names().collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_max_errors_per_field() {
        let schema = Schema::builder()
            .field(
                "code",
                FieldSpec::new()
                    .rule("string", true)
                    .rule("minLength", 3)
                    .rule("pattern", "^[A-Z]+$"),
            )
            .build();
        let input = object(json!({ "code": 12 }));

        let err = Transformer::new(&schema, &StandardRules)
            .run(input.clone())
            .await
            .unwrap_err();
        assert_eq!(err.failures().unwrap().get("code").unwrap().len(), 1);

        let err = Transformer::new(&schema, &StandardRules)
            .max_errors_per_field(5)
            .run(input)
            .await
            .unwrap_err();
        let rules: Vec<_> = err.failures().unwrap().get("code").unwrap().iter().map(|f| f.rule.as_str()).collect();
        assert_eq!(rules, vec!["string", "minLength", "pattern"]);
    }

    #[tokio::test]
    async fn test_zero_max_errors_treated_as_one() {
        let schema = Schema::builder()
            .field("x", FieldSpec::new().rule("string", true).rule("minLength", 10))
            .build();

        let err = Transformer::new(&schema, &StandardRules)
            .max_errors_per_field(0)
            .run(object(json!({ "x": 1 })))
            .await
            .unwrap_err();
        assert_eq!(err.failures().unwrap().get("x").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_rule_is_unexpected() {
        let schema = Schema::builder()
            .field("x", FieldSpec::new().rule("sparkly", true))
            .build();

        let err = run(&schema, json!({ "x": 1 })).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Unexpected(UnexpectedError::UnknownRule { .. })
        ));
    }

    struct SlowUnique;

    #[async_trait]
    impl RuleEvaluator for SlowUnique {
        async fn evaluate<'a>(&self, check: RuleCheck<'a>) -> Result<RuleOutcome, UnexpectedError> {
            tokio::time::sleep(Duration::from_millis(5)).await;
            Ok(match check.value.and_then(Value::as_str) {
                Some("taken") => RuleOutcome::fail(format!("{} is already taken", check.field)),
                _ => RuleOutcome::Pass,
            })
        }
    }

    #[tokio::test]
    async fn test_async_evaluator() {
        let rules = RuleRegistry::new().with_rule("unique", SlowUnique);
        let schema = Schema::builder()
            .field("username", FieldSpec::new().required().rule("unique", true))
            .build();

        let ok = Transformer::new(&schema, &rules)
            .run(object(json!({ "username": "fresh" })))
            .await
            .unwrap();
        assert_eq!(Value::Object(ok), json!({ "username": "fresh" }));

        let err = Transformer::new(&schema, &rules)
            .run(object(json!({ "username": "taken" })))
            .await
            .unwrap_err();
        assert_eq!(
            err.failures().unwrap().get("username").unwrap()[0].message,
            "username is already taken"
        );
    }

    struct Broken;

    #[async_trait]
    impl RuleEvaluator for Broken {
        async fn evaluate<'a>(&self, check: RuleCheck<'a>) -> Result<RuleOutcome, UnexpectedError> {
            Err(UnexpectedError::evaluator(
                check.field,
                check.rule,
                anyhow::anyhow!("connection refused"),
            ))
        }
    }

    #[tokio::test]
    async fn test_evaluator_error_is_unexpected() {
        let schema = book_schema();
        let err = Transformer::new(&schema, &Broken)
            .run(object(json!({ "name": "Tom" })))
            .await
            .unwrap_err();
        assert!(!err.is_validation());
    }

    fn sample_schema() -> Schema {
        Schema::from_value(&json!({
            "name": { "$validate": { "string": true } },
            "age": { "$default": 18, "$validate": { "integer": true, "min": 0 } },
            "tags": { "$validate": { "array": true } },
            "confirm": { "$project": false }
        }))
        .unwrap()
    }

    proptest! {
        #[test]
        fn prop_unknown_keys_never_reach_output(
            keys in proptest::collection::btree_set("[a-z]{1,6}", 0..8),
        ) {
            let schema = sample_schema();
            let mut input = Params::new();
            for key in &keys {
                input.insert(key.clone(), Value::String(key.clone()));
            }

            let result = tokio_test::block_on(Transformer::new(&schema, &StandardRules).run(input));
            if let Ok(output) = result {
                for key in output.keys() {
                    prop_assert!(schema.field(key).is_some_and(FieldSpec::is_projected), "{key}");
                }
            }
        }

        #[test]
        fn prop_idempotent_on_validated_output(
            name in proptest::option::of("[A-Za-z ]{0,12}"),
            age in proptest::option::of(0i64..120),
            extra in any::<bool>(),
        ) {
            let schema = sample_schema();
            let mut input = Params::new();
            if let Some(name) = name {
                input.insert("name".into(), json!(name));
            }
            if let Some(age) = age {
                input.insert("age".into(), json!(age));
            }
            input.insert("extra".into(), json!(extra));
            input.insert("confirm".into(), json!("x"));

            let transformer = Transformer::new(&schema, &StandardRules);
            let first = tokio_test::block_on(transformer.run(input)).unwrap();
            let second = tokio_test::block_on(transformer.run(first.clone())).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
