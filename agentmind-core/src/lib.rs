//! AgentMind Core - Conversation and Settings Types
//!
//! Pure data structures and transforms with no I/O and no async.
//! The client and TUI crates depend on this; it depends on nothing in the workspace.

pub mod editor;
pub mod error;
pub mod message;
pub mod schema;
pub mod settings;

pub use editor::{FieldDraft, SchemaEditor, NEW_FIELD_NAME};
pub use error::{ValidationError, ValidationResult};
pub use message::{
    AnalysisResult, ChatMessage, Conversation, MessageId, Sender, ANALYSIS_FAILED, GREETING,
};
pub use schema::{
    build_prompt, build_schema, parse_schema, split_prompt, FieldId, FieldType, SchemaDocument,
    SchemaField, MISSING_DESCRIPTION,
};
pub use settings::{
    default_json_schema, AgentSettings, DEFAULT_SYSTEM_PROMPT, DEFAULT_SYSTEM_PROMPT_BASE,
    DEFAULT_SYSTEM_PROMPT_FIELDS,
};
