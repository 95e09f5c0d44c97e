//! Session and analysis coordination against a scripted transport.

use agentmind_client::{
    AnalysisStatus, EventReceiver, ReplyStatus, Session, SessionEvent, APOLOGY_REPLY,
    FALLBACK_REPLY,
};
use agentmind_core::{AgentSettings, AnalysisResult, MessageId, Sender, ANALYSIS_FAILED, GREETING};
use agentmind_test_utils::fixtures::minimal_settings;
use agentmind_test_utils::generators::arb_message_text;
use agentmind_test_utils::{MockBehavior, MockTransport, MOCK_FAILURE_BODY, MOCK_REPLY};
use proptest::prelude::*;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(5);

fn session(mock: &Arc<MockTransport>) -> (Session, EventReceiver) {
    Session::new(mock.clone(), AgentSettings::default())
}

/// Apply events until idle, returning what was applied.
async fn settle(session: &mut Session, rx: &mut EventReceiver) -> Vec<SessionEvent> {
    let mut applied = Vec::new();
    while !session.is_idle() {
        let event = tokio::time::timeout(TIMEOUT, rx.recv())
            .await
            .expect("event before timeout")
            .expect("event channel open");
        applied.push(event.clone());
        session.apply(event);
    }
    applied
}

async fn next_event(rx: &mut EventReceiver) -> SessionEvent {
    tokio::time::timeout(TIMEOUT, rx.recv())
        .await
        .expect("event before timeout")
        .expect("event channel open")
}

fn greeting_id(session: &Session) -> MessageId {
    session.log().messages()[0].id
}

fn analysis_of(session: &Session, id: MessageId) -> AnalysisResult {
    session
        .log()
        .get(id)
        .and_then(|m| m.analysis.clone())
        .expect("message analyzed")
}

fn status_for(events: &[SessionEvent], id: MessageId) -> Option<AnalysisStatus> {
    events.iter().find_map(|event| match event {
        SessionEvent::AnalysisFinished {
            message_id, status, ..
        } if *message_id == id => Some(*status),
        _ => None,
    })
}

#[tokio::test]
async fn test_greeting_is_analyzed_on_start() {
    let mock = Arc::new(MockTransport::new());
    let (mut session, mut rx) = session(&mock);
    let greeting = greeting_id(&session);
    assert_eq!(session.log().messages()[0].text, GREETING);

    session.start();
    assert!(session.is_analyzing(greeting));
    let events = settle(&mut session, &mut rx).await;

    assert_eq!(status_for(&events, greeting), Some(AnalysisStatus::Completed));
    assert_eq!(
        analysis_of(&session, greeting).get("eventType"),
        Some(&json!("AI_RESPONSE"))
    );
    assert!(session.in_flight().is_empty());
}

#[tokio::test]
async fn test_hello_flow() {
    let mock = Arc::new(MockTransport::new());
    let (mut session, mut rx) = session(&mock);
    session.start();
    settle(&mut session, &mut rx).await;

    let id = session.send("Hello").expect("send accepted");
    assert_eq!(session.log().len(), 2);
    let user = session.log().last().unwrap();
    assert_eq!((user.sender, user.text.as_str()), (Sender::User, "Hello"));
    assert!(!user.is_analyzed());
    assert!(session.is_replying());

    // The user message's analysis lands before the reply is appended.
    let event = next_event(&mut rx).await;
    assert!(matches!(event, SessionEvent::AnalysisFinished { message_id, .. } if message_id == id));
    session.apply(event);
    assert_eq!(session.log().len(), 2);
    assert_eq!(
        analysis_of(&session, id).get("messageContent"),
        Some(&json!("Hello"))
    );

    let event = next_event(&mut rx).await;
    assert!(matches!(
        event,
        SessionEvent::ReplyFinished {
            status: ReplyStatus::Delivered,
            ..
        }
    ));
    session.apply(event);
    assert!(!session.is_replying());
    assert_eq!(session.log().len(), 3);
    let reply = session.log().last().unwrap();
    assert_eq!((reply.sender, reply.text.as_str()), (Sender::Ai, MOCK_REPLY));

    // The reply itself is analyzed reactively.
    let reply_id = reply.id;
    settle(&mut session, &mut rx).await;
    assert_eq!(
        analysis_of(&session, reply_id).get("eventType"),
        Some(&json!("AI_RESPONSE"))
    );

    let histories = mock.converse_histories();
    assert_eq!(histories.len(), 1);
    let sent_user = histories[0].last().unwrap();
    assert_eq!(sent_user.id, id);
    assert!(sent_user.analysis.is_some());
}

#[tokio::test]
async fn test_send_while_replying_is_noop() {
    let mock = Arc::new(MockTransport::new().with_chat(MockBehavior::Hang));
    let (mut session, mut rx) = session(&mock);
    session.start();
    settle(&mut session, &mut rx).await;

    assert!(session.send("first").is_some());
    assert!(session.send("second").is_none());
    assert_eq!(session.log().len(), 2);

    let event = next_event(&mut rx).await;
    session.apply(event);
    assert!(session.is_replying());
    assert!(session.send("third").is_none());
    assert_eq!(session.log().len(), 2);

    session.shutdown();
    let events = settle(&mut session, &mut rx).await;
    assert!(events.iter().any(|e| matches!(
        e,
        SessionEvent::ReplyFinished {
            status: ReplyStatus::Failed,
            ..
        }
    )));
    assert_eq!(session.log().len(), 3);
    assert_eq!(session.log().last().unwrap().text, APOLOGY_REPLY);
    assert!(!session.is_replying());
}

#[tokio::test]
async fn test_blank_send_is_noop() {
    let mock = Arc::new(MockTransport::new());
    let (mut session, _rx) = session(&mock);
    assert!(session.send("   \t").is_none());
    assert!(session.send("").is_none());
    assert_eq!(session.log().len(), 1);
    assert!(!session.is_replying());
}

#[tokio::test]
async fn test_send_trims_text() {
    let mock = Arc::new(MockTransport::new());
    let (mut session, mut rx) = session(&mock);
    let id = session.send("  Hello  ").unwrap();
    settle(&mut session, &mut rx).await;
    assert_eq!(session.log().get(id).unwrap().text, "Hello");
}

#[tokio::test]
async fn test_analysis_500_attaches_sentinel_and_still_replies() {
    let mock = Arc::new(MockTransport::new().with_user_analysis(MockBehavior::Fail(500)));
    let (mut session, mut rx) = session(&mock);
    session.start();
    settle(&mut session, &mut rx).await;

    let id = session.send("Hello").unwrap();
    let events = settle(&mut session, &mut rx).await;
    assert_eq!(status_for(&events, id), Some(AnalysisStatus::Failed));

    let sentinel = analysis_of(&session, id);
    assert!(sentinel.is_failure());
    assert_eq!(sentinel.get("error"), Some(&json!(ANALYSIS_FAILED)));
    assert_eq!(
        sentinel.get("details"),
        Some(&json!(format!(
            "Request to /api/analysis failed with status 500: {}",
            MOCK_FAILURE_BODY
        )))
    );

    assert_eq!(session.log().len(), 3);
    assert_eq!(session.log().last().unwrap().text, MOCK_REPLY);

    let history = &mock.converse_histories()[0];
    let sent_user = history.iter().find(|m| m.id == id).unwrap();
    assert_eq!(sent_user.analysis.as_ref(), Some(&sentinel));
}

#[tokio::test]
async fn test_ai_analysis_failure_attaches_sentinel() {
    let mock = Arc::new(MockTransport::new().with_ai_analysis(MockBehavior::Fail(502)));
    let (mut session, mut rx) = session(&mock);
    session.start();
    settle(&mut session, &mut rx).await;

    let greeting = analysis_of(&session, greeting_id(&session));
    assert!(greeting.is_failure());
    assert_eq!(mock.analyze_count(greeting_id(&session)), 1);
}

#[tokio::test]
async fn test_missing_reply_uses_fallback() {
    let mock = Arc::new(MockTransport::new().with_reply(None));
    let (mut session, mut rx) = session(&mock);
    session.send("Hello").unwrap();
    settle(&mut session, &mut rx).await;
    assert_eq!(session.log().last().unwrap().text, FALLBACK_REPLY);
}

#[tokio::test]
async fn test_empty_reply_is_kept() {
    let mock = Arc::new(MockTransport::new().with_reply(Some("")));
    let (mut session, mut rx) = session(&mock);
    session.send("Hello").unwrap();
    settle(&mut session, &mut rx).await;
    assert_eq!(session.log().last().unwrap().text, "");
}

#[tokio::test]
async fn test_chat_failure_appends_apology_and_recovers() {
    let mock = Arc::new(MockTransport::new().with_chat(MockBehavior::Fail(503)));
    let (mut session, mut rx) = session(&mock);
    session.send("Hello").unwrap();
    let events = settle(&mut session, &mut rx).await;

    assert!(events.iter().any(|e| matches!(
        e,
        SessionEvent::ReplyFinished {
            status: ReplyStatus::Failed,
            ..
        }
    )));
    assert_eq!(session.log().last().unwrap().text, APOLOGY_REPLY);
    assert!(session.send("again").is_some());
}

#[tokio::test]
async fn test_new_message_supersedes_greeting_analysis() {
    let mock = Arc::new(MockTransport::new().with_analysis_for(GREETING, MockBehavior::Hang));
    let (mut session, mut rx) = session(&mock);
    let greeting = greeting_id(&session);
    session.start();
    assert!(session.is_analyzing(greeting));

    let id = session.send("Hello").unwrap();
    let events = settle(&mut session, &mut rx).await;

    assert_eq!(status_for(&events, greeting), Some(AnalysisStatus::Cancelled));
    assert!(analysis_of(&session, greeting).is_failure());
    assert_eq!(status_for(&events, id), Some(AnalysisStatus::Completed));
    assert_eq!(mock.analyze_count(greeting), 1);
    assert_eq!(session.log().len(), 3);
    assert!(session.log().messages().iter().all(|m| m.is_analyzed()));
}

#[tokio::test]
async fn test_settings_change_cancels_without_retry() {
    let mock = Arc::new(MockTransport::new().with_ai_analysis(MockBehavior::Hang));
    let (mut session, mut rx) = session(&mock);
    let greeting = greeting_id(&session);
    session.start();

    session.update_settings(minimal_settings());
    let events = settle(&mut session, &mut rx).await;

    assert_eq!(status_for(&events, greeting), Some(AnalysisStatus::Cancelled));
    assert!(analysis_of(&session, greeting).is_failure());
    assert_eq!(mock.analyze_count(greeting), 1);
    assert_eq!(session.settings(), &minimal_settings());
}

#[tokio::test]
async fn test_analyzed_messages_are_never_resubmitted() {
    let mock = Arc::new(MockTransport::new());
    let (mut session, mut rx) = session(&mock);
    session.start();
    session.send("Hello").unwrap();
    settle(&mut session, &mut rx).await;
    let before = mock.analyzed_ids();

    session.reconcile();
    session.update_settings(AgentSettings::default());
    session.update_settings(minimal_settings());
    tokio::task::yield_now().await;

    assert!(session.is_idle());
    assert_eq!(mock.analyzed_ids(), before);
}

#[tokio::test]
async fn test_stale_result_for_unknown_message_is_ignored() {
    let mock = Arc::new(MockTransport::new());
    let (mut session, _rx) = session(&mock);
    let before = session.log().clone();

    session.apply(SessionEvent::AnalysisFinished {
        message_id: MessageId::new(),
        analysis: AnalysisResult::failed("late"),
        status: AnalysisStatus::Failed,
    });
    assert_eq!(session.log(), &before);
}

#[tokio::test]
async fn test_late_result_does_not_overwrite() {
    let mock = Arc::new(MockTransport::new());
    let (mut session, mut rx) = session(&mock);
    session.start();
    settle(&mut session, &mut rx).await;
    let greeting = greeting_id(&session);
    let first = analysis_of(&session, greeting);

    session.apply(SessionEvent::AnalysisFinished {
        message_id: greeting,
        analysis: AnalysisResult::failed("late"),
        status: AnalysisStatus::Cancelled,
    });
    assert_eq!(analysis_of(&session, greeting), first);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_each_message_analyzed_once(texts in prop::collection::vec(arb_message_text(), 0..6)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async {
            let mock = Arc::new(MockTransport::new());
            let (mut session, mut rx) = session(&mock);
            session.start();
            settle(&mut session, &mut rx).await;

            let mut accepted = 0;
            for text in &texts {
                if session.send(text).is_some() {
                    accepted += 1;
                }
                settle(&mut session, &mut rx).await;
            }

            prop_assert_eq!(session.log().len(), 1 + 2 * accepted);
            prop_assert!(mock.max_concurrency_per_message() <= 1);
            for message in session.log().messages() {
                prop_assert!(message.is_analyzed());
                prop_assert_eq!(mock.analyze_count(message.id), 1);
            }
            Ok(())
        })?;
    }
}
