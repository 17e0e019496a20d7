//! Schema - Define type schemas for resources
//!
//! Providers define schemas for each resource type and data source,
//! so invalid configuration is rejected before any API call.

use std::collections::HashMap;
use std::fmt;

use regex::Regex;

use crate::resource::Value;

/// Attribute type
#[derive(Debug, Clone)]
pub enum AttributeType {
    /// String
    String,
    /// Integer
    Int,
    /// Boolean
    Bool,
    /// Enum (list of allowed values)
    Enum(Vec<String>),
    /// Custom type (with validation function)
    Custom {
        name: String,
        base: Box<AttributeType>,
        validate: fn(&Value) -> Result<(), String>,
    },
    /// List
    List(Box<AttributeType>),
    /// Map
    Map(Box<AttributeType>),
    /// Nested block with its own attribute set
    Object(Vec<AttributeSchema>),
}

impl AttributeType {
    /// Convenience constructor for a string enum
    pub fn one_of(values: &[&str]) -> Self {
        AttributeType::Enum(values.iter().map(|v| v.to_string()).collect())
    }

    /// List of nested blocks
    pub fn list_of_objects(attributes: Vec<AttributeSchema>) -> Self {
        AttributeType::List(Box::new(AttributeType::Object(attributes)))
    }

    /// Check if a value conforms to this type
    pub fn validate(&self, value: &Value) -> Result<(), TypeError> {
        match (self, value) {
            (AttributeType::String, Value::String(_)) => Ok(()),
            (AttributeType::Int, Value::Int(_)) => Ok(()),
            (AttributeType::Bool, Value::Bool(_)) => Ok(()),

            (AttributeType::Enum(variants), Value::String(s)) => {
                if variants.iter().any(|v| v == s) {
                    Ok(())
                } else {
                    Err(TypeError::InvalidEnumVariant {
                        value: s.clone(),
                        expected: variants.clone(),
                    })
                }
            }

            (AttributeType::Custom { validate, base, .. }, v) => {
                base.validate(v)?;
                validate(v).map_err(|msg| TypeError::ValidationFailed { message: msg })
            }

            (AttributeType::List(inner), Value::List(items)) => {
                for (i, item) in items.iter().enumerate() {
                    inner.validate(item).map_err(|e| TypeError::ListItemError {
                        index: i,
                        inner: Box::new(e),
                    })?;
                }
                Ok(())
            }

            (AttributeType::Map(inner), Value::Map(map)) => {
                for (k, v) in map {
                    inner.validate(v).map_err(|e| TypeError::MapValueError {
                        key: k.clone(),
                        inner: Box::new(e),
                    })?;
                }
                Ok(())
            }

            (AttributeType::Object(attributes), Value::Map(map)) => {
                let errors = validate_attribute_set(attributes.iter(), map);
                match errors.into_iter().next() {
                    None => Ok(()),
                    Some(e) => Err(e),
                }
            }

            _ => Err(TypeError::TypeMismatch {
                expected: self.type_name(),
                got: value.type_name(),
            }),
        }
    }

    fn type_name(&self) -> String {
        match self {
            AttributeType::String => "String".to_string(),
            AttributeType::Int => "Int".to_string(),
            AttributeType::Bool => "Bool".to_string(),
            AttributeType::Enum(variants) => format!("Enum({})", variants.join(" | ")),
            AttributeType::Custom { name, .. } => name.clone(),
            AttributeType::List(inner) => format!("List<{}>", inner.type_name()),
            AttributeType::Map(inner) => format!("Map<{}>", inner.type_name()),
            AttributeType::Object(_) => "Object".to_string(),
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Value-level rule checked after the type matches
#[derive(Debug, Clone)]
pub enum Validation {
    /// Inclusive character count bounds
    StringLenBetween(usize, usize),
    /// Regex the whole string must match, with the message shown on failure
    StringMatch { pattern: Regex, message: String },
    /// Inclusive integer bounds
    IntBetween(i64, i64),
}

impl Validation {
    /// Build a `StringMatch` rule. Panics on an invalid pattern, which is a
    /// programming error in a static schema.
    pub fn string_match(pattern: &str, message: impl Into<String>) -> Self {
        Validation::StringMatch {
            pattern: Regex::new(pattern).expect("schema regex must compile"),
            message: message.into(),
        }
    }

    pub fn check(&self, value: &Value) -> Result<(), String> {
        match (self, value) {
            (Validation::StringLenBetween(min, max), Value::String(s)) => {
                let len = s.chars().count();
                if len < *min || len > *max {
                    Err(format!(
                        "expected length to be in the range ({} - {}), got {}",
                        min, max, len
                    ))
                } else {
                    Ok(())
                }
            }
            (Validation::StringMatch { pattern, message }, Value::String(s)) => {
                if pattern.is_match(s) {
                    Ok(())
                } else {
                    Err(format!("invalid value '{}': {}", s, message))
                }
            }
            (Validation::IntBetween(min, max), Value::Int(n)) => {
                if n < min || n > max {
                    Err(format!(
                        "expected to be in the range ({} - {}), got {}",
                        min, max, n
                    ))
                } else {
                    Ok(())
                }
            }
            // Type mismatches are reported by the attribute type itself
            _ => Ok(()),
        }
    }
}

/// Type error
#[derive(Debug, Clone, thiserror::Error)]
pub enum TypeError {
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("Invalid enum variant '{value}', expected one of: {}", expected.join(", "))]
    InvalidEnumVariant {
        value: String,
        expected: Vec<String>,
    },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Required attribute '{name}' is missing")]
    MissingRequired { name: String },

    #[error("Unknown attribute '{name}'")]
    UnknownAttribute { name: String },

    #[error("Attribute '{name}' is computed and cannot be set")]
    ReadOnly { name: String },

    #[error("Attribute '{name}': {inner}")]
    Attribute { name: String, inner: Box<TypeError> },

    #[error("List item at index {index}: {inner}")]
    ListItemError { index: usize, inner: Box<TypeError> },

    #[error("Map value for key '{key}': {inner}")]
    MapValueError { key: String, inner: Box<TypeError> },
}

impl TypeError {
    /// Name of the top-level attribute this error is tied to, if any
    pub fn attribute(&self) -> Option<&str> {
        match self {
            TypeError::MissingRequired { name }
            | TypeError::UnknownAttribute { name }
            | TypeError::ReadOnly { name }
            | TypeError::Attribute { name, .. } => Some(name),
            _ => None,
        }
    }
}

impl Value {
    fn type_name(&self) -> String {
        match self {
            Value::String(_) => "String".to_string(),
            Value::Int(_) => "Int".to_string(),
            Value::Bool(_) => "Bool".to_string(),
            Value::List(_) => "List".to_string(),
            Value::Map(_) => "Map".to_string(),
        }
    }
}

/// Attribute schema
#[derive(Debug, Clone)]
pub struct AttributeSchema {
    pub name: String,
    pub attr_type: AttributeType,
    pub required: bool,
    /// May be set by the user
    pub optional: bool,
    /// Filled in by the platform when not set
    pub computed: bool,
    /// Changing the value requires replacing the remote resource
    pub force_new: bool,
    pub description: Option<String>,
    pub validations: Vec<Validation>,
}

impl AttributeSchema {
    pub fn new(name: impl Into<String>, attr_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attr_type,
            required: false,
            optional: true,
            computed: false,
            force_new: false,
            description: None,
            validations: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self.optional = false;
        self
    }

    /// Optional attribute the platform fills in when omitted
    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    /// Attribute only ever set by the platform
    pub fn read_only(mut self) -> Self {
        self.computed = true;
        self.optional = false;
        self.required = false;
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn with_validation(mut self, validation: Validation) -> Self {
        self.validations.push(validation);
        self
    }

    /// True when the user is not allowed to set this attribute
    pub fn is_read_only(&self) -> bool {
        !self.required && !self.optional
    }

    /// Check a user-supplied value against type and validations
    pub fn validate_value(&self, value: &Value) -> Result<(), TypeError> {
        self.attr_type.validate(value)?;
        for validation in &self.validations {
            validation
                .check(value)
                .map_err(|message| TypeError::ValidationFailed { message })?;
        }
        Ok(())
    }
}

/// Validate a map of values against a set of attribute schemas.
/// Errors are returned in attribute-name order.
fn validate_attribute_set<'a>(
    schemas: impl Iterator<Item = &'a AttributeSchema>,
    attributes: &HashMap<String, Value>,
) -> Vec<TypeError> {
    let by_name: HashMap<&str, &AttributeSchema> =
        schemas.map(|s| (s.name.as_str(), s)).collect();
    let mut errors = Vec::new();

    let mut names: Vec<&&str> = by_name.keys().collect();
    names.sort();
    for name in names {
        let schema = by_name[*name];
        if schema.required && !attributes.contains_key(*name) {
            errors.push(TypeError::MissingRequired {
                name: name.to_string(),
            });
        }
    }

    let mut keys: Vec<&String> = attributes.keys().collect();
    keys.sort();
    for key in keys {
        let value = &attributes[key];
        match by_name.get(key.as_str()) {
            None => errors.push(TypeError::UnknownAttribute { name: key.clone() }),
            Some(schema) if schema.is_read_only() => {
                errors.push(TypeError::ReadOnly { name: key.clone() })
            }
            Some(schema) => {
                if let Err(e) = schema.validate_value(value) {
                    errors.push(TypeError::Attribute {
                        name: key.clone(),
                        inner: Box::new(e),
                    });
                }
            }
        }
    }

    errors
}

/// Resource schema
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    pub resource_type: String,
    pub attributes: HashMap<String, AttributeSchema>,
    pub description: Option<String>,
}

impl ResourceSchema {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            attributes: HashMap::new(),
            description: None,
        }
    }

    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.attributes.insert(schema.name.clone(), schema);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&AttributeSchema> {
        self.attributes.get(name)
    }

    /// Copy of this schema under another type name with every attribute
    /// read-only. Singular data sources start from this and layer their
    /// inputs on top with [`ResourceSchema::attribute`].
    pub fn to_read_only(&self, resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            attributes: self
                .attributes
                .iter()
                .map(|(name, attr)| {
                    let mut attr = attr.clone().read_only();
                    attr.force_new = false;
                    attr.validations.clear();
                    (name.clone(), attr)
                })
                .collect(),
            description: self.description.clone(),
        }
    }

    /// Whether changing `name` forces a replacement
    pub fn is_force_new(&self, name: &str) -> bool {
        self.attributes.get(name).is_some_and(|a| a.force_new)
    }

    /// Validate resource attributes
    pub fn validate(&self, attributes: &HashMap<String, Value>) -> Result<(), Vec<TypeError>> {
        let errors = validate_attribute_set(self.attributes.values(), attributes);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Helper functions for common types
pub mod types {
    use super::*;

    /// 32-bit signed integer, the width the NCloud APIs accept
    pub fn int32() -> AttributeType {
        AttributeType::Custom {
            name: "Int32".to_string(),
            base: Box::new(AttributeType::Int),
            validate: |value| match value {
                Value::Int(n) if i32::try_from(*n).is_ok() => Ok(()),
                Value::Int(n) => Err(format!("{} does not fit in a 32-bit integer", n)),
                _ => Err("Expected integer".to_string()),
            },
        }
    }

    /// List of strings
    pub fn string_list() -> AttributeType {
        AttributeType::List(Box::new(AttributeType::String))
    }
}
