//! AgentMind TUI entry point.

use agentmind_client::{
    AgentTransport, CommandRecognizer, JsonFileStore, KeyValueStore, RestClient, SettingsStore,
    SpeechRecognizer, SpeechSink, UnsupportedRecognizer,
};
use agentmind_tui::config::TuiConfig;
use agentmind_tui::error::TuiError;
use agentmind_tui::events::TuiEvent;
use agentmind_tui::health::spawn_health_monitor;
use agentmind_tui::keys::map_key;
use agentmind_tui::logging::init_logging;
use agentmind_tui::state::App;
use agentmind_tui::views::render_view;
use crossterm::{
    event::{self, Event as CrosstermEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), TuiError> {
    let config = TuiConfig::load()?;
    init_logging(&config.log_path)?;

    let client_config = config.client_config();
    tracing::info!(api_base_url = %client_config.api_base_url, "Starting AgentMind TUI");
    let transport: Arc<dyn AgentTransport> = Arc::new(RestClient::new(&client_config)?);
    let store: Box<dyn KeyValueStore> = Box::new(JsonFileStore::new(config.settings_path.clone()));
    let settings = SettingsStore::open(store);

    let (event_tx, mut event_rx) = mpsc::channel::<TuiEvent>(256);
    let speech = build_recognizer(&config);
    let sink = speech_sink(event_tx.clone());
    let (mut app, mut session_rx) = App::new(config, transport.clone(), settings, speech, sink);

    let mut terminal = setup_terminal()?;
    let _guard = TerminalGuard;

    let shutdown = CancellationToken::new();
    spawn_input_reader(event_tx.clone());
    let health = spawn_health_monitor(
        transport,
        app.config.health.clone(),
        event_tx.clone(),
        shutdown.clone(),
    );
    app.start();

    let mut ticker = tokio::time::interval(Duration::from_millis(app.config.tick_ms));

    loop {
        terminal.draw(|f| render_view(f, &app))?;

        tokio::select! {
            _ = ticker.tick() => app.on_tick(),
            Some(event) = session_rx.recv() => app.handle_session_event(event),
            Some(event) = event_rx.recv() => {
                if handle_event(&mut app, event) {
                    break;
                }
            }
        }
    }

    shutdown.cancel();
    app.shutdown();
    if let Err(err) = health.await {
        tracing::warn!(error = %err, "Health monitor ended abnormally");
    }
    tracing::info!("AgentMind TUI stopped");
    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, TuiError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = execute!(stdout, LeaveAlternateScreen);
    }
}

fn spawn_input_reader(sender: mpsc::Sender<TuiEvent>) {
    std::thread::spawn(move || loop {
        if let Ok(true) = event::poll(Duration::from_millis(200)) {
            let event = match event::read() {
                Ok(CrosstermEvent::Key(key)) => TuiEvent::Input(key),
                Ok(CrosstermEvent::Resize(width, height)) => TuiEvent::Resize { width, height },
                _ => continue,
            };
            if sender.blocking_send(event).is_err() {
                break;
            }
        }
    });
}

fn build_recognizer(config: &TuiConfig) -> Box<dyn SpeechRecognizer> {
    match &config.speech.command {
        Some(command) => Box::new(CommandRecognizer::new(
            command.clone(),
            config.speech.args.clone(),
            config.speech_config(),
        )),
        None => Box::new(UnsupportedRecognizer),
    }
}

fn speech_sink(sender: mpsc::Sender<TuiEvent>) -> SpeechSink {
    Arc::new(move |event| {
        if let Err(err) = sender.try_send(TuiEvent::Speech(event)) {
            tracing::warn!(error = %err, "Dropped speech event");
        }
    })
}

fn handle_event(app: &mut App, event: TuiEvent) -> bool {
    match event {
        TuiEvent::Input(key) => {
            if let Some(action) = map_key(key, app.input_mode()) {
                return app.handle_action(action);
            }
        }
        TuiEvent::Speech(event) => app.handle_speech_event(event),
        TuiEvent::Health(ready) => app.handle_health(ready),
        TuiEvent::Resize { .. } => {}
    }
    false
}
