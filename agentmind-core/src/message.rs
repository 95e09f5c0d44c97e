//! Conversation log types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

/// Error label carried by the sentinel analysis payload.
pub const ANALYSIS_FAILED: &str = "Analysis failed";

/// Opening AI message every new session starts with.
pub const GREETING: &str = "Вітаю! Я ваш AI-агент. Можу аналізувати кожне повідомлення та вести діалог. Запитайте щось або скористайтеся голосовим введенням.";

// ============================================================================
// IDENTITY
// ============================================================================

/// Message identifier using UUIDv7 so ids sort by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for MessageId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

impl Sender {
    pub fn label(&self) -> &'static str {
        match self {
            Sender::User => "User",
            Sender::Ai => "AI",
        }
    }
}

// ============================================================================
// ANALYSIS
// ============================================================================

/// Structured analysis of one message, shaped by the current JSON Schema.
///
/// On failure this degenerates to the sentinel `{error, details}` so renderers
/// never need a separate "failed" representation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalysisResult(Map<String, Value>);

impl AnalysisResult {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Sentinel payload substituted when an analysis request fails.
    pub fn failed(details: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("error".to_string(), Value::String(ANALYSIS_FAILED.to_string()));
        fields.insert("details".to_string(), Value::String(details.into()));
        Self(fields)
    }

    pub fn is_failure(&self) -> bool {
        self.0.get("error").and_then(Value::as_str) == Some(ANALYSIS_FAILED)
            && self.0.contains_key("details")
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    /// Pretty JSON rendering (two-space indent).
    pub fn to_pretty_json(&self) -> String {
        format!("{:#}", Value::Object(self.0.clone()))
    }
}

impl From<Map<String, Value>> for AnalysisResult {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

// ============================================================================
// MESSAGES
// ============================================================================

/// One entry of the conversation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub sender: Sender,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisResult>,
}

impl ChatMessage {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            sender,
            text: text.into(),
            analysis: None,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text)
    }

    pub fn ai(text: impl Into<String>) -> Self {
        Self::new(Sender::Ai, text)
    }

    pub fn with_analysis(mut self, analysis: AnalysisResult) -> Self {
        self.analysis = Some(analysis);
        self
    }

    pub fn is_analyzed(&self) -> bool {
        self.analysis.is_some()
    }
}

/// Ordered, append-only message log.
///
/// Entries are only ever updated through [`Conversation::attach_analysis`],
/// which is keyed by id so out-of-order completions cannot touch the wrong entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// A log holding the opening AI greeting.
    pub fn with_greeting() -> Self {
        let mut conversation = Self::new();
        conversation.push(ChatMessage::ai(GREETING));
        conversation
    }

    pub fn push(&mut self, message: ChatMessage) -> MessageId {
        let id = message.id;
        self.messages.push(message);
        id
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn get(&self, id: MessageId) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Attach `analysis` to the message with `id`.
    ///
    /// Returns `false` without writing when the message is unknown or already
    /// carries an analysis; a message is analyzed at most once.
    pub fn attach_analysis(&mut self, id: MessageId, analysis: AnalysisResult) -> bool {
        match self.messages.iter_mut().find(|m| m.id == id) {
            Some(message) if message.analysis.is_none() => {
                message.analysis = Some(analysis);
                true
            }
            _ => false,
        }
    }

    /// Messages that carry an analysis, in log order.
    pub fn analyzed(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter().filter(|m| m.analysis.is_some())
    }
}

// ============================================================================
// TESTS
// ============================================================================
