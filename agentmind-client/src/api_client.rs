//! HTTP transport to the agent backend.

use crate::config::ClientConfig;
use agentmind_core::{AgentSettings, AnalysisResult, ChatMessage, MessageId, Sender};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const ANALYSIS_PATH: &str = "/api/analysis";
pub const CHAT_PATH: &str = "/api/chat";
pub const HEALTH_PATH: &str = "/health/ready";

#[derive(Debug, thiserror::Error)]
pub enum ApiClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Request to {path} failed with status {status}: {body}")]
    Status {
        path: String,
        status: u16,
        body: String,
    },
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Request cancelled")]
    Cancelled,
    #[error("Config error: {0}")]
    Config(String),
}

impl ApiClientError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ApiClientError::Cancelled)
    }

    /// HTTP status of a non-success response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiClientError::Status { status, .. } => Some(*status),
            ApiClientError::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

// ============================================================================
// WIRE TYPES
// ============================================================================

/// A message as the backend sees it.
///
/// `analysis` only travels in conversation history, and only once known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessagePayload {
    pub id: MessageId,
    pub text: String,
    pub sender: Sender,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisResult>,
}

impl MessagePayload {
    /// Identity, text and sender only.
    pub fn bare(message: &ChatMessage) -> Self {
        Self {
            id: message.id,
            text: message.text.clone(),
            sender: message.sender,
            analysis: None,
        }
    }
}

impl From<&ChatMessage> for MessagePayload {
    fn from(message: &ChatMessage) -> Self {
        Self {
            analysis: message.analysis.clone(),
            ..Self::bare(message)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub message: MessagePayload,
    pub settings: AgentSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationRequest {
    pub messages: Vec<MessagePayload>,
    pub settings: AgentSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub message_id: String,
    pub analysis: AnalysisResult,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationResponse {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn is_ready(&self) -> bool {
        self.status == "ok"
    }
}

// ============================================================================
// TRANSPORT SEAM
// ============================================================================

/// Operations the session needs from the backend.
///
/// `analyze` and `converse` must resolve to [`ApiClientError::Cancelled`]
/// promptly once their token fires. `health` never fails; any problem is
/// reported as `false`.
#[async_trait]
pub trait AgentTransport: Send + Sync {
    async fn analyze(
        &self,
        message: &ChatMessage,
        settings: &AgentSettings,
        cancel: &CancellationToken,
    ) -> Result<AnalysisResponse, ApiClientError>;

    async fn converse(
        &self,
        history: &[ChatMessage],
        settings: &AgentSettings,
        cancel: &CancellationToken,
    ) -> Result<ConversationResponse, ApiClientError>;

    async fn health(&self) -> bool;
}

/// Race `future` against `token`, preferring cancellation.
pub async fn cancellable<T, F>(token: &CancellationToken, future: F) -> Result<T, ApiClientError>
where
    F: Future<Output = Result<T, ApiClientError>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(ApiClientError::Cancelled),
        result = future => result,
    }
}

// ============================================================================
// REST CLIENT
// ============================================================================

#[derive(Clone)]
pub struct RestClient {
    client: reqwest::Client,
    base_url: String,
}

impl RestClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiClientError> {
        let base_url = config.api_base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ApiClientError::Config("api_base_url is empty".to_string()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .default_headers(headers)
            .build()?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URLs pass through; relative paths are joined to the base.
    pub fn build_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    async fn post_json<T, B>(&self, path: &str, body: &B) -> Result<T, ApiClientError>
    where
        T: serde::de::DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self
            .client
            .post(self.build_url(path))
            .json(body)
            .send()
            .await?;
        self.parse_response(path, response).await
    }

    async fn get_json<T>(&self, path: &str) -> Result<T, ApiClientError>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self.client.get(self.build_url(path)).send().await?;
        self.parse_response(path, response).await
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        response: reqwest::Response,
    ) -> Result<T, ApiClientError> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json::<T>().await?)
        } else {
            let body = response.text().await?;
            Err(ApiClientError::Status {
                path: path.to_string(),
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[async_trait]
impl AgentTransport for RestClient {
    async fn analyze(
        &self,
        message: &ChatMessage,
        settings: &AgentSettings,
        cancel: &CancellationToken,
    ) -> Result<AnalysisResponse, ApiClientError> {
        let body = AnalysisRequest {
            message: MessagePayload::bare(message),
            settings: settings.clone(),
        };
        tracing::debug!(message_id = %message.id, "Requesting analysis");
        cancellable(cancel, self.post_json(ANALYSIS_PATH, &body)).await
    }

    async fn converse(
        &self,
        history: &[ChatMessage],
        settings: &AgentSettings,
        cancel: &CancellationToken,
    ) -> Result<ConversationResponse, ApiClientError> {
        let body = ConversationRequest {
            messages: history.iter().map(MessagePayload::from).collect(),
            settings: settings.clone(),
        };
        tracing::debug!(history_len = history.len(), "Requesting reply");
        cancellable(cancel, self.post_json(CHAT_PATH, &body)).await
    }

    async fn health(&self) -> bool {
        match self.get_json::<HealthResponse>(HEALTH_PATH).await {
            Ok(health) if health.is_ready() => true,
            Ok(health) => {
                tracing::warn!(status = %health.status, "Backend reported not ready");
                false
            }
            Err(err) => {
                tracing::warn!(error = %err, "Health check failed");
                false
            }
        }
    }
}
