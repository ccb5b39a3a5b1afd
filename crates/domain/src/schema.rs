use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The primitive field types a constrained generation schema can declare
/// (spec.md §4.A "generate constrained").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    StringArray,
}

/// A single named field in a declared output schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaField {
    pub field_type: FieldType,
    #[serde(default)]
    pub nullable: bool,
    /// Restricts `field_type: string` to a closed set of accepted values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SchemaField {
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            nullable: false,
            enum_values: None,
            description: None,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn with_enum(mut self, values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.enum_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A closed-set declared schema handed to the Model Adapter's
/// schema-constrained generation operation (spec.md §4.A, §7).
///
/// Mirrors the role `docgemma.agent.schemas`'s Pydantic models play in the
/// original implementation, but as data rather than as Python types: each
/// node builds the `OutputSchema` it needs for its own classification
/// (`ComplexityClassification`, `DecomposedIntent`, `ToolCall`, ...) and the
/// adapter is responsible for translating it into the wire-level
/// `response_format` its backend expects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSchema {
    pub name: String,
    pub fields: BTreeMap<String, SchemaField>,
    pub required: Vec<String>,
}

impl OutputSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: BTreeMap::new(),
            required: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, field: SchemaField, required: bool) -> Self {
        let name = name.into();
        if required {
            self.required.push(name.clone());
        }
        self.fields.insert(name, field);
        self
    }

    /// Validates that a returned JSON object satisfies this schema's field
    /// types, nullability, and enum constraints. Used by adapters that
    /// cannot rely on their backend to enforce the schema natively.
    pub fn validate(&self, value: &serde_json::Value) -> Result<(), String> {
        let obj = value
            .as_object()
            .ok_or_else(|| "expected a JSON object".to_string())?;

        for name in &self.required {
            if !obj.contains_key(name) {
                return Err(format!("missing required field `{name}`"));
            }
        }

        for (name, field) in &self.fields {
            let Some(v) = obj.get(name) else { continue };
            if v.is_null() {
                if field.nullable {
                    continue;
                }
                return Err(format!("field `{name}` is not nullable"));
            }
            let type_ok = match field.field_type {
                FieldType::String => v.is_string(),
                FieldType::Integer => v.is_i64() || v.is_u64(),
                FieldType::Number => v.is_number(),
                FieldType::Boolean => v.is_boolean(),
                FieldType::StringArray => {
                    v.is_array() && v.as_array().unwrap().iter().all(|e| e.is_string())
                }
            };
            if !type_ok {
                return Err(format!("field `{name}` has the wrong type"));
            }
            if let (FieldType::String, Some(allowed)) = (field.field_type, &field.enum_values) {
                let s = v.as_str().unwrap_or_default();
                if !allowed.iter().any(|a| a == s) {
                    return Err(format!("field `{name}` value `{s}` is not in the allowed set"));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn intent_schema() -> OutputSchema {
        OutputSchema::new("decomposed_intent")
            .field(
                "needs_tool",
                SchemaField::new(FieldType::Boolean),
                true,
            )
            .field(
                "tool_name",
                SchemaField::new(FieldType::String)
                    .nullable()
                    .with_enum(["check_drug_safety", "none"]),
                true,
            )
    }

    #[test]
    fn validate_accepts_well_formed_value() {
        let schema = intent_schema();
        let value = json!({"needs_tool": true, "tool_name": "check_drug_safety"});
        assert!(schema.validate(&value).is_ok());
    }

    #[test]
    fn validate_rejects_missing_required_field() {
        let schema = intent_schema();
        let value = json!({"needs_tool": true});
        assert!(schema.validate(&value).is_err());
    }

    #[test]
    fn validate_rejects_value_outside_enum() {
        let schema = intent_schema();
        let value = json!({"needs_tool": true, "tool_name": "not_a_real_tool"});
        assert!(schema.validate(&value).is_err());
    }

    #[test]
    fn validate_allows_null_for_nullable_field() {
        let schema = intent_schema();
        let value = json!({"needs_tool": false, "tool_name": null});
        assert!(schema.validate(&value).is_ok());
    }
}
