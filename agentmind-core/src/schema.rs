//! Schema builder: typed field list <-> JSON Schema document + prompt suffix.
//!
//! Everything here is pure. Decoding never fails loudly: malformed schema
//! text reduces to an empty field list.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

/// Prompt bullet text for a field without a description.
pub const MISSING_DESCRIPTION: &str = "(опис відсутній)";

/// Editor-local field identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldId(Uuid);

impl FieldId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for FieldId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// JSON types a field may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    String,
    Number,
    Integer,
    Boolean,
    Array,
}

impl FieldType {
    pub fn all() -> &'static [FieldType] {
        &[
            FieldType::String,
            FieldType::Number,
            FieldType::Integer,
            FieldType::Boolean,
            FieldType::Array,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Integer => "integer",
            FieldType::Boolean => "boolean",
            FieldType::Array => "array",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::all().iter().copied().find(|t| t.as_str() == value)
    }

    /// Next type in declaration order, wrapping around.
    pub fn next(&self) -> FieldType {
        let all = Self::all();
        let idx = all.iter().position(|t| t == self).unwrap_or(0);
        all[(idx + 1) % all.len()]
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One property of the analysis schema as the editor sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaField {
    pub id: FieldId,
    pub name: String,
    pub field_type: FieldType,
    pub description: String,
    /// Comma-separated allowed values; meaningful only for string fields.
    pub enum_values: String,
    pub required: bool,
}

impl SchemaField {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            id: FieldId::new(),
            name: name.into(),
            field_type,
            description: String::new(),
            enum_values: String::new(),
            required: false,
        }
    }

    /// Trimmed, non-empty enum tokens.
    pub fn enum_tokens(&self) -> Vec<String> {
        self.enum_values
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Object schema produced from a field list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaDocument {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub properties: Map<String, Value>,
    pub required: Vec<String>,
}

impl SchemaDocument {
    pub fn to_value(&self) -> Value {
        let mut doc = Map::new();
        doc.insert("type".to_string(), Value::String(self.schema_type.clone()));
        doc.insert("properties".to_string(), Value::Object(self.properties.clone()));
        doc.insert(
            "required".to_string(),
            Value::Array(self.required.iter().cloned().map(Value::String).collect()),
        );
        Value::Object(doc)
    }

    pub fn to_pretty_json(&self) -> String {
        format!("{:#}", self.to_value())
    }
}

/// Decode an object schema into editor fields.
///
/// Returns an empty list when the text is not JSON, the top-level `type`
/// is not `"object"`, or there are no `properties`.
pub fn parse_schema(json_schema: &str) -> Vec<SchemaField> {
    let Ok(schema) = serde_json::from_str::<Value>(json_schema) else {
        return Vec::new();
    };
    if schema.get("type").and_then(Value::as_str) != Some("object") {
        return Vec::new();
    }
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Vec::new();
    };

    let required: HashSet<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    properties
        .iter()
        .map(|(name, property)| {
            let field_type = property
                .get("type")
                .and_then(Value::as_str)
                .and_then(FieldType::parse)
                .unwrap_or_default();
            let description = property
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let enum_values = match (field_type, property.get("enum").and_then(Value::as_array)) {
                (FieldType::String, Some(values)) => values
                    .iter()
                    .map(|v| match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(", "),
                _ => String::new(),
            };

            SchemaField {
                id: FieldId::new(),
                name: name.clone(),
                field_type,
                description,
                enum_values,
                required: required.contains(name.as_str()),
            }
        })
        .collect()
}

/// Encode a field list as an object schema.
pub fn build_schema(fields: &[SchemaField]) -> SchemaDocument {
    let mut properties = Map::new();
    for field in fields {
        let mut entry = Map::new();
        entry.insert(
            "type".to_string(),
            Value::String(field.field_type.as_str().to_string()),
        );
        entry.insert(
            "description".to_string(),
            Value::String(field.description.clone()),
        );
        if field.field_type == FieldType::String {
            let tokens = field.enum_tokens();
            if !tokens.is_empty() {
                entry.insert(
                    "enum".to_string(),
                    Value::Array(tokens.into_iter().map(Value::String).collect()),
                );
            }
        }
        if field.field_type == FieldType::Array {
            let mut items = Map::new();
            items.insert("type".to_string(), Value::String("string".to_string()));
            entry.insert("items".to_string(), Value::Object(items));
        }
        properties.insert(field.name.clone(), Value::Object(entry));
    }

    SchemaDocument {
        schema_type: "object".to_string(),
        properties,
        required: fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.clone())
            .collect(),
    }
}

/// Base instruction followed by one `- name: description` bullet per field.
///
/// Multi-line descriptions are folded onto their bullet line.
pub fn build_prompt(base_prompt: &str, fields: &[SchemaField]) -> String {
    let descriptions = fields
        .iter()
        .map(|field| {
            let description = fold_lines(&field.description);
            let description = if description.is_empty() {
                MISSING_DESCRIPTION
            } else {
                description.as_ref()
            };
            format!("- {}: {}", field.name, description)
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!("{}\n\n{}", base_prompt.trim(), descriptions)
        .trim()
        .to_string()
}

/// Recover the editable base instruction from a saved system prompt.
///
/// Strips the exact field list [`build_prompt`] renders for `fields`. A
/// prompt that does not end with that list is returned whole, so text is
/// never dropped when the prompt and the schema disagree.
pub fn split_prompt(system_prompt: &str, fields: &[SchemaField]) -> String {
    let prompt = system_prompt.trim();
    if fields.is_empty() {
        return prompt.to_string();
    }
    let list = build_prompt("", fields);
    match prompt.strip_suffix(list.as_str()) {
        Some("") => String::new(),
        Some(base) if base.ends_with("\n\n") => base.trim().to_string(),
        _ => prompt.to_string(),
    }
}

fn fold_lines(text: &str) -> Cow<'_, str> {
    if !text.contains(['\n', '\r']) {
        return Cow::Borrowed(text);
    }
    let folded = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    Cow::Owned(folded)
}
