//! Declarative input schemas and the shared validator
//!
//! Every operation declares its parameters as an `InputSchema`. Raw call
//! arguments are checked against it once, producing a `ValidatedInput` that
//! handlers read from instead of untyped JSON.

use std::collections::{BTreeMap, HashMap};

use rust_mcp_sdk::schema::ToolInputSchema;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::errors::{FieldViolation, GatewayError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

impl FieldType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }

    fn convert(self, value: &Value) -> Option<ArgValue> {
        match (self, value) {
            (Self::String, Value::String(text)) => Some(ArgValue::String(text.clone())),
            (Self::Number, Value::Number(number)) => number.as_f64().map(ArgValue::Number),
            (Self::Integer, Value::Number(number)) => number.as_i64().map(ArgValue::Integer),
            (Self::Boolean, Value::Bool(flag)) => Some(ArgValue::Boolean(*flag)),
            (Self::Array, Value::Array(items)) => Some(ArgValue::Array(items.clone())),
            (Self::Object, Value::Object(map)) => Some(ArgValue::Object(map.clone())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub field_type: FieldType,
    pub optional: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputSchema {
    fields: BTreeMap<String, FieldSpec>,
}

impl InputSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.field(name, field_type, false, None)
    }

    pub fn optional(self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.field(name, field_type, true, None)
    }

    pub fn field(
        mut self,
        name: impl Into<String>,
        field_type: FieldType,
        optional: bool,
        description: Option<&str>,
    ) -> Self {
        self.fields.insert(
            name.into(),
            FieldSpec {
                field_type,
                optional,
                description: description.map(str::to_string),
            },
        );
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    /// Renders the schema as the `inputSchema` advertised by `tools/list`.
    pub fn to_tool_input_schema(&self) -> ToolInputSchema {
        let mut properties = HashMap::new();
        let mut required = Vec::new();

        for (name, spec) in self.fields() {
            let mut property = Map::new();
            property.insert("type".to_string(), json!(spec.field_type.as_str()));
            if let Some(description) = &spec.description {
                property.insert("description".to_string(), json!(description));
            }
            properties.insert(name.to_string(), property);

            if !spec.optional {
                required.push(name.to_string());
            }
        }

        ToolInputSchema::new(required, Some(properties), None)
    }

    /// Structural validation only: presence and type of declared fields.
    /// Undeclared fields are ignored. A null or absent payload is treated as
    /// an empty argument object.
    pub fn validate(&self, payload: &Value) -> Result<ValidatedInput, GatewayError> {
        let empty = Map::new();
        let arguments = match payload {
            Value::Object(map) => map,
            Value::Null => &empty,
            _ => {
                return Err(GatewayError::SchemaValidation(vec![
                    FieldViolation::type_mismatch("arguments", FieldType::Object),
                ]))
            }
        };

        let mut values = BTreeMap::new();
        let mut violations = Vec::new();

        for (name, spec) in &self.fields {
            match arguments.get(name) {
                None if spec.optional => {}
                None => violations.push(FieldViolation::missing(name, spec.field_type)),
                Some(raw) => match spec.field_type.convert(raw) {
                    Some(value) => {
                        values.insert(name.clone(), value);
                    }
                    None => violations.push(FieldViolation::type_mismatch(name, spec.field_type)),
                },
            }
        }

        if violations.is_empty() {
            Ok(ValidatedInput { values })
        } else {
            Err(GatewayError::SchemaValidation(violations))
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    String(String),
    Number(f64),
    Integer(i64),
    Boolean(bool),
    Array(Vec<Value>),
    Object(Map<String, Value>),
}

/// Arguments that passed schema validation. Only declared fields are kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedInput {
    values: BTreeMap<String, ArgValue>,
}

impl ValidatedInput {
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values.get(name)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(ArgValue::String(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        match self.values.get(name) {
            Some(ArgValue::Number(number)) => Some(*number),
            Some(ArgValue::Integer(number)) => Some(*number as f64),
            _ => None,
        }
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        match self.values.get(name) {
            Some(ArgValue::Integer(number)) => Some(*number),
            _ => None,
        }
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        match self.values.get(name) {
            Some(ArgValue::Boolean(flag)) => Some(*flag),
            _ => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
