//! Analyst agent settings and their compiled-in defaults.

use crate::error::{ValidationError, ValidationResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

macro_rules! prompt_base {
    () => {
        "Ви — високоінтелектуальний агент-аналітик. Ваше завдання — проаналізувати ОДНУ подію-повідомлення з розмови та класифікувати її.
Повідомлення матиме префікс, що вказує на відправника ('User:' або 'AI:').

- Ваш результат ПОВИНЕН бути валідним JSON-об'єктом, що суворо відповідає наданій схемі.
- Не додавайте жодного зайвого тексту чи пояснень поза структурою JSON.
- Аналізуйте ЛИШЕ надане повідомлення. Не робіть висновків на основі попередньої історії розмови."
    };
}

macro_rules! prompt_fields {
    () => {
        "- eventType: Тип події.
- messageContent: Копія тексту повідомлення, що аналізується.
- detectedIntent: Основний намір або мета цього конкретного повідомлення.
- entities: Список ключових сутностей (люди, місця, поняття), згаданих у цьому повідомленні.
- sentiment: Тональність (сентимент) повідомлення."
    };
}

/// Base analyst instruction without the field bullet list.
pub const DEFAULT_SYSTEM_PROMPT_BASE: &str = prompt_base!();

/// Bullet list describing the default schema fields.
pub const DEFAULT_SYSTEM_PROMPT_FIELDS: &str = prompt_fields!();

/// Full default system prompt.
pub const DEFAULT_SYSTEM_PROMPT: &str = concat!(prompt_base!(), "\n\n", prompt_fields!());

/// Default five-field analysis schema, pretty printed.
pub fn default_json_schema() -> String {
    let schema = json!({
        "type": "object",
        "properties": {
            "eventType": {
                "type": "string",
                "description": "Тип події.",
                "enum": ["USER_MESSAGE", "AI_RESPONSE"]
            },
            "messageContent": {
                "type": "string",
                "description": "Копія тексту повідомлення, що аналізується."
            },
            "detectedIntent": {
                "type": "string",
                "description": "Основний намір або мета цього конкретного повідомлення."
            },
            "entities": {
                "type": "array",
                "description": "Список ключових сутностей (люди, місця, поняття), згаданих у цьому повідомленні.",
                "items": { "type": "string" }
            },
            "sentiment": {
                "type": "string",
                "description": "Тональність (сентимент) повідомлення.",
                "enum": ["positive", "negative", "neutral"]
            }
        },
        "required": ["eventType", "messageContent", "detectedIntent", "entities", "sentiment"]
    });
    format!("{:#}", schema)
}

/// User-editable analyst configuration.
///
/// `json_schema` holds serialized JSON Schema text. It must parse as JSON
/// before it is accepted anywhere settings are persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSettings {
    pub system_prompt: String,
    pub json_schema: String,
}

impl AgentSettings {
    pub fn new(system_prompt: impl Into<String>, json_schema: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            json_schema: json_schema.into(),
        }
    }

    /// Check that `json_schema` parses as JSON.
    pub fn validate(&self) -> ValidationResult<()> {
        self.parsed_schema().map(|_| ())
    }

    pub fn parsed_schema(&self) -> ValidationResult<Value> {
        serde_json::from_str(&self.json_schema).map_err(|e| ValidationError::InvalidSchema {
            reason: e.to_string(),
        })
    }
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            json_schema: default_json_schema(),
        }
    }
}
