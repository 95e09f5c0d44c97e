//! AgentMind client engine.
//!
//! Transport to the agent backend, persisted settings, the per-message
//! analysis coordinator and the conversation session built on top of it.

pub mod api_client;
pub mod config;
pub mod coordinator;
pub mod session;
pub mod settings_store;
pub mod speech;
pub mod store;

pub use api_client::{
    cancellable, AgentTransport, AnalysisRequest, AnalysisResponse, ApiClientError,
    ConversationRequest, ConversationResponse, HealthResponse, MessagePayload, RestClient,
    ANALYSIS_PATH, CHAT_PATH, HEALTH_PATH,
};
pub use config::{ClientConfig, API_BASE_URL_ENV, DEFAULT_API_BASE_URL};
pub use coordinator::{
    AnalysisCoordinator, AnalysisStatus, EventReceiver, EventSender, ReplyStatus, SessionEvent,
};
pub use session::{Session, APOLOGY_REPLY, FALLBACK_REPLY};
pub use settings_store::{SettingsStore, SETTINGS_KEY};
pub use speech::{
    CommandRecognizer, SpeechConfig, SpeechError, SpeechEvent, SpeechRecognizer, SpeechSink,
    UnsupportedRecognizer,
};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore, StoreError};
