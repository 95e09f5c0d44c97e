use agentmind_client::AgentTransport;
use agentmind_core::{AnalysisResult, FieldType, Sender};
use agentmind_test_utils::MockTransport;
use agentmind_tui::config::{HealthConfig, SpeechCommandConfig, ThemeConfig, TuiConfig};
use agentmind_tui::events::TuiEvent;
use agentmind_tui::health::{next_backoff, spawn_health_monitor};
use agentmind_tui::keys::{map_key, Action, InputMode};
use agentmind_tui::nav::View;
use agentmind_tui::state::HealthState;
use agentmind_tui::theme::{
    analysis_color, field_type_color, health_color, sender_color, SynthBruteTheme,
};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
    KeyEvent {
        code,
        modifiers,
        kind: KeyEventKind::Press,
        state: KeyEventState::empty(),
    }
}

fn base_config() -> TuiConfig {
    TuiConfig {
        api_base_url: Some("http://localhost:8000".to_string()),
        request_timeout_ms: 5_000,
        settings_path: "tmp/agentmind-settings.json".into(),
        log_path: "tmp/agentmind-tui.log".into(),
        tick_ms: 250,
        theme: ThemeConfig {
            name: "synthbrute".to_string(),
        },
        health: HealthConfig {
            initial_ms: 250,
            max_ms: 5_000,
            multiplier: 1.5,
            jitter_ms: 100,
            interval_ms: 10_000,
        },
        speech: SpeechCommandConfig::default(),
    }
}

#[test]
fn config_base_is_valid() {
    assert!(base_config().validate().is_ok());
}

#[test]
fn config_requires_known_theme() {
    let mut config = base_config();
    config.theme = ThemeConfig {
        name: "unknown".to_string(),
    };
    assert!(config.validate().is_err());

    config.theme.name = "SynthBrute".to_string();
    assert!(config.validate().is_ok());
}

#[test]
fn config_rejects_bad_values() {
    let cases: Vec<Box<dyn Fn(&mut TuiConfig)>> = vec![
        Box::new(|c: &mut TuiConfig| c.request_timeout_ms = 0),
        Box::new(|c: &mut TuiConfig| c.tick_ms = 0),
        Box::new(|c: &mut TuiConfig| c.settings_path = "".into()),
        Box::new(|c: &mut TuiConfig| c.log_path = "".into()),
        Box::new(|c: &mut TuiConfig| c.api_base_url = Some("  ".to_string())),
        Box::new(|c: &mut TuiConfig| c.health.initial_ms = 0),
        Box::new(|c: &mut TuiConfig| c.health.max_ms = 10),
        Box::new(|c: &mut TuiConfig| c.health.multiplier = 0.5),
        Box::new(|c: &mut TuiConfig| c.health.interval_ms = 0),
        Box::new(|c: &mut TuiConfig| c.speech.command = Some(String::new())),
    ];
    for (index, mutate) in cases.iter().enumerate() {
        let mut config = base_config();
        mutate(&mut config);
        assert!(config.validate().is_err(), "case {} accepted", index);
    }
}

#[test]
fn config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("agentmind.toml");
    std::fs::write(
        &path,
        r#"
        request_timeout_ms = 5000
        settings_path = "tmp/agentmind-settings.json"
        log_path = "tmp/agentmind-tui.log"

        [theme]
        name = "synthbrute"

        [speech]
        command = "whisper-once"
        args = ["--lang", "uk"]
        "#,
    )
    .unwrap();

    let config = TuiConfig::from_path(&path).unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.api_base_url, None);
    assert_eq!(config.speech.command.as_deref(), Some("whisper-once"));
    assert_eq!(config.speech.args, vec!["--lang", "uk"]);
}

#[test]
fn global_keys_work_in_both_modes() {
    for mode in [InputMode::Text, InputMode::Command] {
        assert_eq!(
            map_key(key(KeyCode::Char('c'), KeyModifiers::CONTROL), mode),
            Some(Action::Quit)
        );
        assert_eq!(
            map_key(key(KeyCode::F(5), KeyModifiers::NONE), mode),
            Some(Action::ToggleVoice)
        );
        assert_eq!(
            map_key(key(KeyCode::Esc, KeyModifiers::NONE), mode),
            Some(Action::Cancel)
        );
    }
}

#[test]
fn enter_depends_on_mode() {
    assert_eq!(
        map_key(key(KeyCode::Enter, KeyModifiers::NONE), InputMode::Text),
        Some(Action::Submit)
    );
    assert_eq!(
        map_key(key(KeyCode::Enter, KeyModifiers::ALT), InputMode::Text),
        Some(Action::Newline)
    );
    assert_eq!(
        map_key(key(KeyCode::Enter, KeyModifiers::NONE), InputMode::Command),
        Some(Action::EditField)
    );
}

#[test]
fn release_events_are_ignored() {
    let mut event = key(KeyCode::Char('q'), KeyModifiers::NONE);
    event.kind = KeyEventKind::Release;
    assert_eq!(map_key(event, InputMode::Command), None);
}

#[test]
fn theme_colors_distinguish_states() {
    let theme = SynthBruteTheme::synthbrute();
    assert_ne!(
        sender_color(Sender::User, &theme),
        sender_color(Sender::Ai, &theme)
    );
    assert_eq!(
        analysis_color(Some(&AnalysisResult::failed("x")), &theme),
        theme.error
    );
    assert_eq!(analysis_color(None, &theme), theme.text_dim);
    assert_eq!(health_color(HealthState::Ready, &theme), theme.success);
    assert_eq!(health_color(HealthState::Unavailable, &theme), theme.error);
    for field_type in FieldType::all() {
        assert_ne!(field_type_color(*field_type, &theme), theme.bg);
    }
}

#[tokio::test]
async fn health_monitor_reports_ready() {
    let mock = Arc::new(MockTransport::new());
    let transport: Arc<dyn AgentTransport> = mock.clone();
    let (tx, mut rx) = mpsc::channel(8);
    let shutdown = CancellationToken::new();

    let handle = spawn_health_monitor(transport, base_config().health, tx, shutdown.clone());
    let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap();
    assert!(matches!(event, Some(TuiEvent::Health(true))));

    shutdown.cancel();
    handle.await.unwrap();
    assert_eq!(mock.health_checks(), 1);
}

#[tokio::test]
async fn health_monitor_retries_while_unavailable() {
    let mock = Arc::new(MockTransport::new().with_health(false));
    let transport: Arc<dyn AgentTransport> = mock.clone();
    let (tx, mut rx) = mpsc::channel(8);
    let shutdown = CancellationToken::new();
    let config = HealthConfig {
        initial_ms: 1,
        max_ms: 5,
        multiplier: 2.0,
        jitter_ms: 0,
        interval_ms: 10_000,
    };

    let handle = spawn_health_monitor(transport, config, tx, shutdown.clone());
    for _ in 0..3 {
        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap();
        assert!(matches!(event, Some(TuiEvent::Health(false))));
    }

    shutdown.cancel();
    handle.await.unwrap();
    assert!(mock.health_checks() >= 3);
}

#[tokio::test]
async fn health_monitor_stops_when_receiver_dropped() {
    let transport: Arc<dyn AgentTransport> = Arc::new(MockTransport::new());
    let (tx, rx) = mpsc::channel(8);
    drop(rx);

    let handle = spawn_health_monitor(
        transport,
        base_config().health,
        tx,
        CancellationToken::new(),
    );
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
}

proptest! {
    #[test]
    fn text_mode_inserts_printable_chars(c in any::<char>().prop_filter("printable", |c| !c.is_control())) {
        let action = map_key(key(KeyCode::Char(c), KeyModifiers::NONE), InputMode::Text);
        prop_assert_eq!(action, Some(Action::Insert(c)));

        let shifted = map_key(key(KeyCode::Char(c), KeyModifiers::SHIFT), InputMode::Text);
        prop_assert_eq!(shifted, Some(Action::Insert(c)));
    }

    #[test]
    fn function_keys_switch_views(n in 1u8..=3u8) {
        for mode in [InputMode::Text, InputMode::Command] {
            let action = map_key(key(KeyCode::F(n), KeyModifiers::NONE), mode);
            prop_assert_eq!(action, Some(Action::SwitchView(usize::from(n - 1))));
            prop_assert!(View::from_index(usize::from(n - 1)).is_some());
        }
    }

    #[test]
    fn command_digits_switch_views(digit in 0u8..=9u8) {
        let ch = char::from(b'0' + digit);
        let action = map_key(key(KeyCode::Char(ch), KeyModifiers::NONE), InputMode::Command);
        let expected = match ch {
            '1' => Some(Action::SwitchView(0)),
            '2' => Some(Action::SwitchView(1)),
            '3' => Some(Action::SwitchView(2)),
            _ => None,
        };
        prop_assert_eq!(action, expected);
    }

    #[test]
    fn view_next_previous_are_inverse(index in 0usize..3) {
        let view = View::from_index(index).unwrap();
        prop_assert_eq!(view.next().previous(), view);
        prop_assert_eq!(view.previous().next(), view);
    }

    #[test]
    fn backoff_stays_within_bounds(
        initial in 1u64..1_000,
        extra in 0u64..10_000,
        multiplier in 1.0f64..4.0,
        steps in 1usize..20,
    ) {
        let config = HealthConfig {
            initial_ms: initial,
            max_ms: initial + extra,
            multiplier,
            jitter_ms: 0,
            interval_ms: 1_000,
        };
        let mut backoff = config.initial_ms;
        for _ in 0..steps {
            let next = next_backoff(backoff, &config);
            prop_assert!(next >= backoff);
            prop_assert!(next <= config.max_ms);
            backoff = next;
        }
    }

    #[test]
    fn health_config_validation_matches_bounds(
        initial in 0u64..1_000,
        max in 0u64..1_000,
        multiplier in 0.0f64..3.0,
    ) {
        let mut config = base_config();
        config.health.initial_ms = initial;
        config.health.max_ms = max;
        config.health.multiplier = multiplier;
        let valid = initial > 0 && max >= initial && multiplier >= 1.0;
        prop_assert_eq!(config.validate().is_ok(), valid);
    }
}
