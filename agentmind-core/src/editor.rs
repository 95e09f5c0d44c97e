//! Field editor working model behind the settings panel.

use crate::error::{ValidationError, ValidationResult};
use crate::schema::{
    build_prompt, build_schema, parse_schema, split_prompt, FieldId, FieldType, SchemaDocument,
    SchemaField,
};
use crate::settings::AgentSettings;
use std::collections::HashSet;

/// Name pre-filled for a freshly added field.
pub const NEW_FIELD_NAME: &str = "newField";

/// Field values being edited, before they receive an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDraft {
    pub name: String,
    pub field_type: FieldType,
    pub description: String,
    pub enum_values: String,
    pub required: bool,
}

impl Default for FieldDraft {
    fn default() -> Self {
        Self {
            name: NEW_FIELD_NAME.to_string(),
            field_type: FieldType::String,
            description: String::new(),
            enum_values: String::new(),
            required: true,
        }
    }
}

impl From<&SchemaField> for FieldDraft {
    fn from(field: &SchemaField) -> Self {
        Self {
            name: field.name.clone(),
            field_type: field.field_type,
            description: field.description.clone(),
            enum_values: field.enum_values.clone(),
            required: field.required,
        }
    }
}

impl FieldDraft {
    fn trimmed_name(&self) -> ValidationResult<String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyFieldName);
        }
        Ok(name.to_string())
    }
}

/// Editable base prompt plus ordered field list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SchemaEditor {
    base_prompt: String,
    fields: Vec<SchemaField>,
}

impl SchemaEditor {
    pub fn from_settings(settings: &AgentSettings) -> Self {
        let fields = parse_schema(&settings.json_schema);
        Self {
            base_prompt: split_prompt(&settings.system_prompt, &fields),
            fields,
        }
    }

    pub fn base_prompt(&self) -> &str {
        &self.base_prompt
    }

    pub fn set_base_prompt(&mut self, prompt: impl Into<String>) {
        self.base_prompt = prompt.into();
    }

    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    pub fn field(&self, id: FieldId) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Append a field, suffixing `_<index>` to a name that is already taken.
    pub fn add_field(&mut self, draft: FieldDraft) -> ValidationResult<FieldId> {
        let name = draft.trimmed_name()?;
        let unique = if self.name_taken(&name, None) {
            let mut index = self.fields.len();
            let mut candidate = format!("{}_{}", name, index);
            while self.name_taken(&candidate, None) {
                index += 1;
                candidate = format!("{}_{}", name, index);
            }
            candidate
        } else {
            name
        };

        let field = SchemaField {
            id: FieldId::new(),
            name: unique,
            field_type: draft.field_type,
            description: draft.description,
            enum_values: draft.enum_values,
            required: draft.required,
        };
        let id = field.id;
        self.fields.push(field);
        Ok(id)
    }

    pub fn update_field(&mut self, id: FieldId, draft: FieldDraft) -> ValidationResult<()> {
        let name = draft.trimmed_name()?;
        if self.name_taken(&name, Some(id)) {
            return Err(ValidationError::DuplicateFieldName { name });
        }
        let field = self
            .fields
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or(ValidationError::UnknownField { id })?;

        field.name = name;
        field.field_type = draft.field_type;
        field.description = draft.description;
        field.enum_values = draft.enum_values;
        field.required = draft.required;
        Ok(())
    }

    pub fn remove_field(&mut self, id: FieldId) -> bool {
        let before = self.fields.len();
        self.fields.retain(|f| f.id != id);
        self.fields.len() != before
    }

    pub fn schema(&self) -> SchemaDocument {
        build_schema(&self.fields)
    }

    /// Pretty JSON of the schema that saving would produce.
    pub fn preview(&self) -> String {
        self.schema().to_pretty_json()
    }

    /// Produce settings from the current base prompt and fields.
    pub fn to_settings(&self) -> ValidationResult<AgentSettings> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name.trim().is_empty() {
                return Err(ValidationError::EmptyFieldName);
            }
            if !seen.insert(field.name.as_str()) {
                return Err(ValidationError::DuplicateFieldName {
                    name: field.name.clone(),
                });
            }
        }

        Ok(AgentSettings {
            system_prompt: build_prompt(&self.base_prompt, &self.fields),
            json_schema: self.preview(),
        })
    }

    fn name_taken(&self, name: &str, except: Option<FieldId>) -> bool {
        self.fields
            .iter()
            .any(|f| f.name == name && Some(f.id) != except)
    }
}
