//! Schema model.
//!
//! A [`Schema`] maps field names to [`FieldSpec`]s. Schemas are immutable
//! once built and are shared by reference across concurrent requests.
//!
//! # Document format
//!
//! ```json
//! {
//!   "$passthrough": false,
//!   "name":    { "$validate": { "required": true, "string": true } },
//!   "limit":   { "$default": 20, "$validate": { "integer": true } },
//!   "secret":  { "$filter": false },
//!   "confirm": { "$validate": { "sameAs": "password" }, "$project": false }
//! }
//! ```
//!
//! `$validate` keeps rule declaration order, which is the order rules run in.

use crate::error::{json_kind, SchemaError};
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Directive holding a field's default value.
pub const DEFAULT: &str = "$default";
/// Directive holding a field's inclusion policy.
pub const FILTER: &str = "$filter";
/// Directive holding a field's validation rules.
pub const VALIDATE: &str = "$validate";
/// Directive holding a field's projection flag.
pub const PROJECT: &str = "$project";
/// Top-level directive that keeps undeclared fields.
pub const PASSTHROUGH: &str = "$passthrough";

/// Specification of a single field.
///
/// # Example
///
/// ```
/// use reqparams_core::FieldSpec;
/// use serde_json::json;
///
/// let spec = FieldSpec::new()
///     .required()
///     .rule("string", json!(true))
///     .with_default(json!("anonymous"));
///
/// assert!(spec.is_included());
/// assert!(spec.is_projected());
/// assert_eq!(spec.rules().count(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    default: Option<Value>,
    include: bool,
    rules: IndexMap<String, Value>,
    project: bool,
}

impl Default for FieldSpec {
    fn default() -> Self {
        Self {
            default: None,
            include: true,
            rules: IndexMap::new(),
            project: true,
        }
    }
}

impl FieldSpec {
    /// Creates a field that is kept, projected and has no rules.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default applied when the field is absent.
    #[must_use]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Appends a validation rule. Rules run in the order they are added.
    #[must_use]
    pub fn rule(mut self, name: impl Into<String>, config: impl Into<Value>) -> Self {
        self.rules.insert(name.into(), config.into());
        self
    }

    /// Shorthand for `rule("required", true)`.
    #[must_use]
    pub fn required(self) -> Self {
        self.rule("required", true)
    }

    /// Drops the field during filtering even though it is declared.
    #[must_use]
    pub fn excluded(mut self) -> Self {
        self.include = false;
        self
    }

    /// Keeps the field for validation but strips it from the output.
    #[must_use]
    pub fn internal(mut self) -> Self {
        self.project = false;
        self
    }

    /// Returns the declared default.
    #[must_use]
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Returns `true` if the field survives filtering.
    #[must_use]
    pub fn is_included(&self) -> bool {
        self.include
    }

    /// Returns `true` if the field survives projection.
    #[must_use]
    pub fn is_projected(&self) -> bool {
        self.project
    }

    /// Returns `true` if the field declares any rules.
    #[must_use]
    pub fn has_rules(&self) -> bool {
        !self.rules.is_empty()
    }

    /// Iterates over `(rule, config)` pairs in declaration order.
    pub fn rules(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.rules.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn from_value(field: &str, value: &Value) -> Result<Self, SchemaError> {
        let object = match value {
            Value::Bool(true) => return Ok(Self::new()),
            Value::Object(object) => object,
            other => {
                return Err(SchemaError::InvalidField {
                    field: field.to_string(),
                    found: json_kind(other),
                })
            }
        };

        let mut spec = Self::new();
        for (directive, value) in object {
            match directive.as_str() {
                DEFAULT => spec.default = Some(value.clone()),
                FILTER => spec.include = directive_bool(field, directive, value)?,
                PROJECT => spec.project = directive_bool(field, directive, value)?,
                VALIDATE => {
                    let rules = value.as_object().ok_or_else(|| SchemaError::InvalidDirective {
                        field: field.to_string(),
                        directive: directive.clone(),
                        expected: "an object of rule names to configurations",
                    })?;
                    spec.rules = rules.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
                }
                _ => {
                    return Err(SchemaError::UnknownDirective {
                        field: field.to_string(),
                        directive: directive.clone(),
                    })
                }
            }
        }

        Ok(spec)
    }
}

fn directive_bool(field: &str, directive: &str, value: &Value) -> Result<bool, SchemaError> {
    value.as_bool().ok_or_else(|| SchemaError::InvalidDirective {
        field: field.to_string(),
        directive: directive.to_string(),
        expected: "a boolean",
    })
}

/// A declarative description of the expected parameters.
///
/// # Example
///
/// ```
/// use reqparams_core::{FieldSpec, Schema};
/// use serde_json::json;
///
/// let built = Schema::builder()
///     .field("name", FieldSpec::new().required().rule("string", true))
///     .build();
///
/// let parsed = Schema::from_value(&json!({
///     "name": { "$validate": { "required": true, "string": true } }
/// }))
/// .unwrap();
///
/// assert_eq!(built, parsed);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    fields: IndexMap<String, FieldSpec>,
    passthrough: bool,
}

impl Schema {
    /// Creates a new schema builder.
    #[must_use]
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Parses a schema document.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidShape`] if `value` is not an object, or
    /// a field-level [`SchemaError`] if any field specification is malformed.
    pub fn from_value(value: &Value) -> Result<Self, SchemaError> {
        let object = value.as_object().ok_or(SchemaError::InvalidShape {
            found: json_kind(value),
        })?;
        Self::from_map(object)
    }

    /// Parses a schema document that is already known to be an object.
    pub fn from_map(object: &Map<String, Value>) -> Result<Self, SchemaError> {
        let mut schema = Self::default();

        for (key, value) in object {
            if key == PASSTHROUGH {
                schema.passthrough = value.as_bool().ok_or_else(|| SchemaError::InvalidDirective {
                    field: String::new(),
                    directive: PASSTHROUGH.to_string(),
                    expected: "a boolean",
                })?;
            } else if key.starts_with('$') {
                return Err(SchemaError::UnknownSchemaDirective {
                    directive: key.clone(),
                });
            } else {
                schema
                    .fields
                    .insert(key.clone(), FieldSpec::from_value(key, value)?);
            }
        }

        Ok(schema)
    }

    /// Returns the specification for a field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    /// Returns `true` if the field is declared.
    #[must_use]
    pub fn declares(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Iterates over declared fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of declared fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if no fields are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns `true` if undeclared fields are kept.
    #[must_use]
    pub fn is_passthrough(&self) -> bool {
        self.passthrough
    }
}

impl TryFrom<Value> for Schema {
    type Error = SchemaError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(&value)
    }
}

impl TryFrom<&Value> for Schema {
    type Error = SchemaError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

/// Builder for [`Schema`].
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    /// Declares a field. Declaring the same name twice replaces the spec.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.schema.fields.insert(name.into(), spec);
        self
    }

    /// Keeps fields the schema does not declare.
    #[must_use]
    pub fn passthrough(mut self, passthrough: bool) -> Self {
        self.schema.passthrough = passthrough;
        self
    }

    /// Builds the schema.
    #[must_use]
    pub fn build(self) -> Schema {
        self.schema
    }
}
