//! AgentMind Test Utilities
//!
//! Shared test infrastructure for the AgentMind workspace:
//! - Scriptable mock transport
//! - Proptest generators for schema fields
//! - Fixtures for analysis payloads

pub use agentmind_client::{
    cancellable, AgentTransport, AnalysisResponse, ApiClientError, ConversationResponse,
};
pub use agentmind_core::{
    AgentSettings, AnalysisResult, ChatMessage, FieldType, MessageId, SchemaField, Sender,
};

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

// ============================================================================
// MOCK TRANSPORT
// ============================================================================

/// How a mocked request resolves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockBehavior {
    Succeed,
    /// Non-success HTTP status with a fixed body.
    Fail(u16),
    /// Never resolves until its token is cancelled.
    Hang,
}

pub const MOCK_REPLY: &str = "Mock reply";
pub const MOCK_FAILURE_BODY: &str = "mock failure";

#[derive(Debug, Default)]
struct CallLog {
    analyzed: Vec<MessageId>,
    histories: Vec<Vec<ChatMessage>>,
    active: HashMap<MessageId, usize>,
    peak: HashMap<MessageId, usize>,
    health_checks: usize,
}

/// Transport with per-sender scripted outcomes that records every call.
#[derive(Debug)]
pub struct MockTransport {
    user_analysis: MockBehavior,
    ai_analysis: MockBehavior,
    by_text: HashMap<String, MockBehavior>,
    chat: MockBehavior,
    reply: Option<String>,
    healthy: bool,
    calls: Mutex<CallLog>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// Everything succeeds; replies are [`MOCK_REPLY`].
    pub fn new() -> Self {
        Self {
            user_analysis: MockBehavior::Succeed,
            ai_analysis: MockBehavior::Succeed,
            by_text: HashMap::new(),
            chat: MockBehavior::Succeed,
            reply: Some(MOCK_REPLY.to_string()),
            healthy: true,
            calls: Mutex::new(CallLog::default()),
        }
    }

    pub fn with_user_analysis(mut self, behavior: MockBehavior) -> Self {
        self.user_analysis = behavior;
        self
    }

    pub fn with_ai_analysis(mut self, behavior: MockBehavior) -> Self {
        self.ai_analysis = behavior;
        self
    }

    /// Override analysis for messages with exactly this text.
    pub fn with_analysis_for(mut self, text: impl Into<String>, behavior: MockBehavior) -> Self {
        self.by_text.insert(text.into(), behavior);
        self
    }

    pub fn with_chat(mut self, behavior: MockBehavior) -> Self {
        self.chat = behavior;
        self
    }

    /// `None` simulates a response without a `message` field.
    pub fn with_reply(mut self, reply: Option<&str>) -> Self {
        self.reply = reply.map(str::to_string);
        self
    }

    pub fn with_health(mut self, healthy: bool) -> Self {
        self.healthy = healthy;
        self
    }

    /// Ids passed to `analyze`, in call order.
    pub fn analyzed_ids(&self) -> Vec<MessageId> {
        self.lock().analyzed.clone()
    }

    pub fn analyze_count(&self, id: MessageId) -> usize {
        self.lock().analyzed.iter().filter(|a| **a == id).count()
    }

    /// Histories passed to `converse`, in call order.
    pub fn converse_histories(&self) -> Vec<Vec<ChatMessage>> {
        self.lock().histories.clone()
    }

    /// Highest number of simultaneous `analyze` calls seen for `id`.
    pub fn peak_concurrency(&self, id: MessageId) -> usize {
        self.lock().peak.get(&id).copied().unwrap_or(0)
    }

    /// Highest per-message concurrency across all messages.
    pub fn max_concurrency_per_message(&self) -> usize {
        self.lock().peak.values().copied().max().unwrap_or(0)
    }

    pub fn health_checks(&self) -> usize {
        self.lock().health_checks
    }

    fn lock(&self) -> MutexGuard<'_, CallLog> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn analysis_behavior(&self, message: &ChatMessage) -> MockBehavior {
        if let Some(behavior) = self.by_text.get(&message.text) {
            return behavior.clone();
        }
        match message.sender {
            Sender::User => self.user_analysis.clone(),
            Sender::Ai => self.ai_analysis.clone(),
        }
    }

    fn enter(&self, id: MessageId) -> ActiveCall<'_> {
        let mut calls = self.lock();
        calls.analyzed.push(id);
        let active = calls.active.entry(id).or_insert(0);
        *active += 1;
        let now = *active;
        let peak = calls.peak.entry(id).or_insert(0);
        *peak = (*peak).max(now);
        ActiveCall { transport: self, id }
    }
}

struct ActiveCall<'a> {
    transport: &'a MockTransport,
    id: MessageId,
}

impl Drop for ActiveCall<'_> {
    fn drop(&mut self) {
        let mut calls = self.transport.lock();
        if let Some(active) = calls.active.get_mut(&self.id) {
            *active = active.saturating_sub(1);
        }
    }
}

async fn perform(
    behavior: MockBehavior,
    path: &str,
    cancel: &CancellationToken,
) -> Result<(), ApiClientError> {
    cancellable(cancel, async {
        match behavior {
            MockBehavior::Succeed => Ok(()),
            MockBehavior::Fail(status) => Err(ApiClientError::Status {
                path: path.to_string(),
                status,
                body: MOCK_FAILURE_BODY.to_string(),
            }),
            MockBehavior::Hang => {
                std::future::pending::<()>().await;
                Ok(())
            }
        }
    })
    .await
}

#[async_trait]
impl AgentTransport for MockTransport {
    async fn analyze(
        &self,
        message: &ChatMessage,
        _settings: &AgentSettings,
        cancel: &CancellationToken,
    ) -> Result<AnalysisResponse, ApiClientError> {
        let _active = self.enter(message.id);
        perform(self.analysis_behavior(message), "/api/analysis", cancel).await?;
        Ok(AnalysisResponse {
            message_id: message.id.to_string(),
            analysis: fixtures::sample_analysis(message),
        })
    }

    async fn converse(
        &self,
        history: &[ChatMessage],
        _settings: &AgentSettings,
        cancel: &CancellationToken,
    ) -> Result<ConversationResponse, ApiClientError> {
        self.lock().histories.push(history.to_vec());
        perform(self.chat.clone(), "/api/chat", cancel).await?;
        Ok(ConversationResponse {
            message: self.reply.clone(),
        })
    }

    async fn health(&self) -> bool {
        self.lock().health_checks += 1;
        self.healthy
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built payloads for common scenarios.

    use super::*;
    use serde_json::{json, Map, Value};

    /// Analysis shaped like the default five-field schema.
    pub fn sample_analysis(message: &ChatMessage) -> AnalysisResult {
        let event_type = match message.sender {
            Sender::User => "USER_MESSAGE",
            Sender::Ai => "AI_RESPONSE",
        };
        let value = json!({
            "eventType": event_type,
            "messageContent": message.text,
            "detectedIntent": "mock intent",
            "entities": [],
            "sentiment": "neutral"
        });
        match value {
            Value::Object(fields) => AnalysisResult::new(fields),
            _ => AnalysisResult::new(Map::new()),
        }
    }

    /// Settings with a minimal one-field schema.
    pub fn minimal_settings() -> AgentSettings {
        AgentSettings::new(
            "Classify the message.\n\n- topic: Main topic",
            r#"{"type":"object","properties":{"topic":{"type":"string","description":"Main topic"}},"required":["topic"]}"#,
        )
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for schema fields.

    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    pub fn arb_field_type() -> impl Strategy<Value = FieldType> {
        prop_oneof![
            Just(FieldType::String),
            Just(FieldType::Number),
            Just(FieldType::Integer),
            Just(FieldType::Boolean),
            Just(FieldType::Array),
        ]
    }

    /// Identifier-like names, never blank.
    pub fn arb_field_name() -> impl Strategy<Value = String> {
        "[a-zA-Z][a-zA-Z0-9_]{0,11}"
    }

    pub fn arb_description() -> impl Strategy<Value = String> {
        "[a-zA-Zа-яА-ЯіїєІЇЄ0-9 ,.()-]{0,40}"
    }

    /// Comma-separated enum list, possibly empty.
    pub fn arb_enum_values() -> impl Strategy<Value = String> {
        prop::collection::vec("[A-Za-z_]{1,8}", 0..4).prop_map(|tokens| tokens.join(", "))
    }

    pub fn arb_schema_field() -> impl Strategy<Value = SchemaField> {
        (
            arb_field_name(),
            arb_field_type(),
            arb_description(),
            arb_enum_values(),
            any::<bool>(),
        )
            .prop_map(|(name, field_type, description, enum_values, required)| SchemaField {
                description,
                enum_values,
                required,
                ..SchemaField::new(name, field_type)
            })
    }

    /// Field lists with unique names, in generation order.
    pub fn arb_unique_fields(max: usize) -> impl Strategy<Value = Vec<SchemaField>> {
        prop::collection::vec(arb_schema_field(), 0..=max).prop_map(|fields| {
            let mut seen = HashSet::new();
            fields
                .into_iter()
                .filter(|f| seen.insert(f.name.clone()))
                .collect()
        })
    }

    /// User input text, including blank and padded variants.
    pub fn arb_message_text() -> impl Strategy<Value = String> {
        prop_oneof![
            Just(String::new()),
            "[ \t]{1,4}",
            "[ ]{0,2}[a-zA-Zа-яА-Я0-9?!.,]{1,20}[ ]{0,2}",
        ]
    }
}
