//! Per-message analysis coordination.
//!
//! The coordinator lives on the session's logical thread. Requests run on
//! spawned tasks which report back only through [`SessionEvent`]s; the
//! owner applies those one at a time, so the in-flight map needs no lock.

use crate::api_client::{AgentTransport, ApiClientError};
use agentmind_core::{AgentSettings, AnalysisResult, ChatMessage, Conversation, MessageId, Sender};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// How an analysis request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisStatus {
    Completed,
    Failed,
    Cancelled,
}

/// How a reply request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyStatus {
    Delivered,
    Failed,
}

/// Completion reports from spawned request tasks.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// `analysis` is the sentinel unless `status` is `Completed`.
    AnalysisFinished {
        message_id: MessageId,
        analysis: AnalysisResult,
        status: AnalysisStatus,
    },
    ReplyFinished {
        reply: String,
        status: ReplyStatus,
    },
}

impl SessionEvent {
    pub(crate) fn analysis_dropped(message_id: MessageId) -> Self {
        SessionEvent::AnalysisFinished {
            message_id,
            analysis: AnalysisResult::failed(ApiClientError::Cancelled.to_string()),
            status: AnalysisStatus::Cancelled,
        }
    }
}

pub type EventSender = mpsc::UnboundedSender<SessionEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<SessionEvent>;

/// Sends `fallback` on drop unless the task reported on its own.
pub(crate) struct EventGuard {
    events: EventSender,
    fallback: Option<SessionEvent>,
}

impl EventGuard {
    pub(crate) fn new(events: EventSender, fallback: SessionEvent) -> Self {
        Self {
            events,
            fallback: Some(fallback),
        }
    }

    pub(crate) fn finish(mut self, event: SessionEvent) {
        self.fallback = None;
        // The receiver is gone only once the session is torn down.
        let _ = self.events.send(event);
    }
}

impl Drop for EventGuard {
    fn drop(&mut self) {
        if let Some(event) = self.fallback.take() {
            let _ = self.events.send(event);
        }
    }
}

/// The reactive request currently standing for "latest message".
#[derive(Debug)]
struct Trigger {
    message_id: MessageId,
    settings: AgentSettings,
    token: CancellationToken,
}

pub struct AnalysisCoordinator {
    transport: Arc<dyn AgentTransport>,
    events: EventSender,
    in_flight: HashMap<MessageId, CancellationToken>,
    trigger: Option<Trigger>,
    root: CancellationToken,
}

impl AnalysisCoordinator {
    pub fn new(transport: Arc<dyn AgentTransport>, events: EventSender) -> Self {
        Self {
            transport,
            events,
            in_flight: HashMap::new(),
            trigger: None,
            root: CancellationToken::new(),
        }
    }

    /// Bring outstanding work in line with the log's latest message.
    ///
    /// Cancels the active trigger when the latest message or the settings
    /// changed, then starts an analysis for the latest message if it is an
    /// unanalyzed AI message with no request in flight.
    pub fn reconcile(&mut self, log: &Conversation, settings: &AgentSettings) {
        let last = log.last();

        let superseded = self.trigger.as_ref().is_some_and(|trigger| {
            Some(trigger.message_id) != last.map(|m| m.id) || &trigger.settings != settings
        });
        if superseded {
            if let Some(trigger) = self.trigger.take() {
                tracing::debug!(message_id = %trigger.message_id, "Superseding analysis");
                trigger.token.cancel();
            }
        }

        let Some(message) = last else {
            return;
        };
        if message.sender != Sender::Ai
            || message.is_analyzed()
            || self.in_flight.contains_key(&message.id)
        {
            return;
        }

        let token = self.register(message.id);
        self.trigger = Some(Trigger {
            message_id: message.id,
            settings: settings.clone(),
            token: token.clone(),
        });
        tokio::spawn(run_analysis(
            Arc::clone(&self.transport),
            message.clone(),
            settings.clone(),
            token,
            self.events.clone(),
        ));
    }

    /// Record an outstanding request for `message_id` and hand out its token.
    pub fn register(&mut self, message_id: MessageId) -> CancellationToken {
        let token = self.root.child_token();
        if let Some(previous) = self.in_flight.insert(message_id, token.clone()) {
            tracing::warn!(message_id = %message_id, "Replacing in-flight analysis");
            previous.cancel();
        }
        token
    }

    /// Release the in-flight entry once its completion has been applied.
    pub fn complete(&mut self, message_id: MessageId) {
        self.in_flight.remove(&message_id);
        if self
            .trigger
            .as_ref()
            .is_some_and(|trigger| trigger.message_id == message_id)
        {
            self.trigger = None;
        }
    }

    /// A token cancelled by [`AnalysisCoordinator::cancel_all`], not tracked per message.
    pub fn child_token(&self) -> CancellationToken {
        self.root.child_token()
    }

    pub fn is_in_flight(&self, message_id: MessageId) -> bool {
        self.in_flight.contains_key(&message_id)
    }

    pub fn in_flight(&self) -> impl Iterator<Item = MessageId> + '_ {
        self.in_flight.keys().copied()
    }

    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn cancel_all(&mut self) {
        self.root.cancel();
        self.trigger = None;
    }

    pub fn transport(&self) -> Arc<dyn AgentTransport> {
        Arc::clone(&self.transport)
    }
}

/// Analyze one message, folding any failure into the sentinel.
pub(crate) async fn analyze_message(
    transport: &dyn AgentTransport,
    message: &ChatMessage,
    settings: &AgentSettings,
    token: &CancellationToken,
) -> (AnalysisResult, AnalysisStatus) {
    match transport.analyze(message, settings, token).await {
        Ok(response) => (response.analysis, AnalysisStatus::Completed),
        Err(err) if err.is_cancelled() => {
            tracing::debug!(message_id = %message.id, "Analysis cancelled");
            (AnalysisResult::failed(err.to_string()), AnalysisStatus::Cancelled)
        }
        Err(err) => {
            tracing::warn!(message_id = %message.id, error = %err, "Analysis failed");
            (AnalysisResult::failed(err.to_string()), AnalysisStatus::Failed)
        }
    }
}

async fn run_analysis(
    transport: Arc<dyn AgentTransport>,
    message: ChatMessage,
    settings: AgentSettings,
    token: CancellationToken,
    events: EventSender,
) {
    let guard = EventGuard::new(events, SessionEvent::analysis_dropped(message.id));
    let (analysis, status) = analyze_message(transport.as_ref(), &message, &settings, &token).await;
    guard.finish(SessionEvent::AnalysisFinished {
        message_id: message.id,
        analysis,
        status,
    });
}
