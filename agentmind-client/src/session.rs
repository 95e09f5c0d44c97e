//! Conversation controller.

use crate::api_client::AgentTransport;
use crate::coordinator::{
    analyze_message, AnalysisCoordinator, EventGuard, EventReceiver, EventSender, ReplyStatus,
    SessionEvent,
};
use agentmind_core::{AgentSettings, ChatMessage, Conversation, MessageId};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Reply text used when the backend answers without a `message`.
pub const FALLBACK_REPLY: &str = "Вибачте, відповідь недоступна.";

/// Reply text used when the reply request fails.
pub const APOLOGY_REPLY: &str = "Вибачте, сталася помилка під час генерації відповіді. Перевірте бекенд або ключі доступу та спробуйте ще раз.";

/// One client session: the message log, the settings in effect and the
/// outstanding requests against them.
pub struct Session {
    log: Conversation,
    settings: AgentSettings,
    coordinator: AnalysisCoordinator,
    events: EventSender,
    replying: bool,
}

impl Session {
    /// A session seeded with the greeting. Nothing is requested until
    /// [`Session::start`].
    pub fn new(transport: Arc<dyn AgentTransport>, settings: AgentSettings) -> (Self, EventReceiver) {
        let (events, receiver) = mpsc::unbounded_channel();
        let session = Self {
            log: Conversation::with_greeting(),
            settings,
            coordinator: AnalysisCoordinator::new(transport, events.clone()),
            events,
            replying: false,
        };
        (session, receiver)
    }

    pub fn start(&mut self) {
        self.reconcile();
    }

    pub fn reconcile(&mut self) {
        self.coordinator.reconcile(&self.log, &self.settings);
    }

    pub fn log(&self) -> &Conversation {
        &self.log
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    /// Submit user text.
    ///
    /// Returns `None` without touching the log when a reply is already in
    /// flight or the text is blank.
    pub fn send(&mut self, text: &str) -> Option<MessageId> {
        if self.replying {
            tracing::debug!("Ignoring send while a reply is in flight");
            return None;
        }
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let message = ChatMessage::user(text);
        let id = self.log.push(message.clone());
        self.replying = true;

        let analysis_token = self.coordinator.register(id);
        let reply_token = self.coordinator.child_token();
        self.reconcile();

        tokio::spawn(run_send(SendJob {
            transport: self.coordinator.transport(),
            history: self.log.messages().to_vec(),
            message,
            settings: self.settings.clone(),
            analysis_token,
            reply_token,
            events: self.events.clone(),
        }));
        tracing::info!(message_id = %id, "User message sent");
        Some(id)
    }

    /// Fold one completion report into the log.
    pub fn apply(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::AnalysisFinished {
                message_id,
                analysis,
                status,
            } => {
                self.coordinator.complete(message_id);
                if self.log.attach_analysis(message_id, analysis) {
                    tracing::debug!(message_id = %message_id, ?status, "Analysis attached");
                } else {
                    tracing::debug!(message_id = %message_id, ?status, "Analysis dropped");
                }
            }
            SessionEvent::ReplyFinished { reply, status } => {
                self.log.push(ChatMessage::ai(reply));
                self.replying = false;
                tracing::debug!(?status, "Reply appended");
            }
        }
        self.reconcile();
    }

    /// Switch settings; a pending reactive analysis for the old settings is cancelled.
    pub fn update_settings(&mut self, settings: AgentSettings) {
        self.settings = settings;
        self.reconcile();
    }

    /// Apply events until nothing is outstanding.
    pub async fn settle(&mut self, events: &mut EventReceiver) {
        while !self.is_idle() {
            match events.recv().await {
                Some(event) => self.apply(event),
                None => break,
            }
        }
    }

    pub fn is_replying(&self) -> bool {
        self.replying
    }

    pub fn is_idle(&self) -> bool {
        !self.replying && self.coordinator.in_flight_len() == 0
    }

    pub fn is_analyzing(&self, message_id: MessageId) -> bool {
        self.coordinator.is_in_flight(message_id)
    }

    pub fn in_flight(&self) -> Vec<MessageId> {
        self.coordinator.in_flight().collect()
    }

    /// Cancel every outstanding request.
    pub fn shutdown(&mut self) {
        self.coordinator.cancel_all();
    }
}

struct SendJob {
    transport: Arc<dyn AgentTransport>,
    history: Vec<ChatMessage>,
    message: ChatMessage,
    settings: AgentSettings,
    analysis_token: CancellationToken,
    reply_token: CancellationToken,
    events: EventSender,
}

/// Analyze the user message, then request the reply with that analysis in
/// the history. Analysis failure never blocks the reply.
async fn run_send(job: SendJob) {
    let SendJob {
        transport,
        mut history,
        message,
        settings,
        analysis_token,
        reply_token,
        events,
    } = job;

    let reply_guard = EventGuard::new(
        events.clone(),
        SessionEvent::ReplyFinished {
            reply: APOLOGY_REPLY.to_string(),
            status: ReplyStatus::Failed,
        },
    );
    let analysis_guard = EventGuard::new(events, SessionEvent::analysis_dropped(message.id));

    let (analysis, status) =
        analyze_message(transport.as_ref(), &message, &settings, &analysis_token).await;
    if let Some(entry) = history.iter_mut().find(|m| m.id == message.id) {
        entry.analysis = Some(analysis.clone());
    }
    analysis_guard.finish(SessionEvent::AnalysisFinished {
        message_id: message.id,
        analysis,
        status,
    });

    let event = match transport.converse(&history, &settings, &reply_token).await {
        Ok(response) => SessionEvent::ReplyFinished {
            reply: response
                .message
                .unwrap_or_else(|| FALLBACK_REPLY.to_string()),
            status: ReplyStatus::Delivered,
        },
        Err(err) => {
            tracing::warn!(error = %err, "Reply request failed");
            SessionEvent::ReplyFinished {
                reply: APOLOGY_REPLY.to_string(),
                status: ReplyStatus::Failed,
            }
        }
    };
    reply_guard.finish(event);
}
