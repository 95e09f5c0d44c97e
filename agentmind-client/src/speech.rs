//! Speech-to-text capability.
//!
//! A recognizer yields at most one transcript per utterance. Platforms
//! without a recognizer use [`UnsupportedRecognizer`].

use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

/// Environment variable carrying the locale to a speech command.
pub const SPEECH_LOCALE_ENV: &str = "AGENTMIND_SPEECH_LOCALE";

/// Recognition parameters. Only single-utterance, final-result mode is
/// implemented; recognizers refuse to start with either flag set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechConfig {
    pub locale: String,
    pub continuous: bool,
    pub interim_results: bool,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            locale: "uk-UA".to_string(),
            continuous: false,
            interim_results: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    Started,
    Transcript(String),
    Ended,
    Error(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("Speech recognition is not supported")]
    Unsupported,
    #[error("Speech recognition is already listening")]
    AlreadyListening,
    #[error("Continuous and interim recognition are not supported")]
    UnsupportedMode,
    #[error("Failed to start speech command: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Receives recognizer events; may be called from any task.
pub type SpeechSink = Arc<dyn Fn(SpeechEvent) + Send + Sync>;

pub trait SpeechRecognizer: Send {
    fn is_supported(&self) -> bool;

    fn is_listening(&self) -> bool;

    /// Begin one utterance. Events arrive on `sink` until `Ended`.
    fn start(&mut self, sink: SpeechSink) -> Result<(), SpeechError>;

    fn stop(&mut self);
}

#[derive(Debug, Default)]
pub struct UnsupportedRecognizer;

impl SpeechRecognizer for UnsupportedRecognizer {
    fn is_supported(&self) -> bool {
        false
    }

    fn is_listening(&self) -> bool {
        false
    }

    fn start(&mut self, _sink: SpeechSink) -> Result<(), SpeechError> {
        Err(SpeechError::Unsupported)
    }

    fn stop(&mut self) {}
}

/// Runs an external speech-to-text command once per utterance.
///
/// The command's trimmed stdout is the transcript. `stop` kills it.
pub struct CommandRecognizer {
    program: String,
    args: Vec<String>,
    config: SpeechConfig,
    active: Option<CancellationToken>,
}

impl CommandRecognizer {
    pub fn new(program: impl Into<String>, args: Vec<String>, config: SpeechConfig) -> Self {
        Self {
            program: program.into(),
            args,
            config,
            active: None,
        }
    }

    pub fn config(&self) -> &SpeechConfig {
        &self.config
    }
}

impl SpeechRecognizer for CommandRecognizer {
    fn is_supported(&self) -> bool {
        true
    }

    fn is_listening(&self) -> bool {
        self.active.as_ref().is_some_and(|token| !token.is_cancelled())
    }

    fn start(&mut self, sink: SpeechSink) -> Result<(), SpeechError> {
        if self.is_listening() {
            return Err(SpeechError::AlreadyListening);
        }
        if self.config.continuous || self.config.interim_results {
            return Err(SpeechError::UnsupportedMode);
        }

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .env(SPEECH_LOCALE_ENV, &self.config.locale)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        let child = command.spawn()?;

        let token = CancellationToken::new();
        self.active = Some(token.clone());
        sink(SpeechEvent::Started);
        tracing::debug!(program = %self.program, locale = %self.config.locale, "Listening");

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!("Speech command stopped");
                }
                output = child.wait_with_output() => match output {
                    Ok(output) if output.status.success() => {
                        let transcript = String::from_utf8_lossy(&output.stdout).trim().to_string();
                        if !transcript.is_empty() {
                            sink(SpeechEvent::Transcript(transcript));
                        }
                    }
                    Ok(output) => {
                        sink(SpeechEvent::Error(format!("speech command exited with {}", output.status)));
                    }
                    Err(err) => {
                        sink(SpeechEvent::Error(err.to_string()));
                    }
                },
            }
            token.cancel();
            sink(SpeechEvent::Ended);
        });
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(token) = self.active.take() {
            token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn channel_sink() -> (SpeechSink, mpsc::UnboundedReceiver<SpeechEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink: SpeechSink = Arc::new(move |event| {
            let _ = tx.send(event);
        });
        (sink, rx)
    }

    async fn collect(mut rx: mpsc::UnboundedReceiver<SpeechEvent>) -> Vec<SpeechEvent> {
        let mut events = Vec::new();
        while let Ok(Some(event)) = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await {
            let ended = event == SpeechEvent::Ended;
            events.push(event);
            if ended {
                break;
            }
        }
        events
    }

    #[test]
    fn test_default_config() {
        let config = SpeechConfig::default();
        assert_eq!(config.locale, "uk-UA");
        assert!(!config.continuous);
        assert!(!config.interim_results);
    }

    #[test]
    fn test_unsupported_recognizer() {
        let mut recognizer = UnsupportedRecognizer;
        let (sink, _rx) = channel_sink();
        assert!(!recognizer.is_supported());
        assert!(matches!(recognizer.start(sink), Err(SpeechError::Unsupported)));
        assert!(!recognizer.is_listening());
    }

    #[tokio::test]
    async fn test_command_rejects_streaming_modes() {
        let modes = [
            SpeechConfig {
                continuous: true,
                ..SpeechConfig::default()
            },
            SpeechConfig {
                interim_results: true,
                ..SpeechConfig::default()
            },
        ];
        for config in modes {
            let mut recognizer = CommandRecognizer::new("sh", Vec::new(), config);
            let (sink, mut rx) = channel_sink();
            assert!(matches!(
                recognizer.start(sink),
                Err(SpeechError::UnsupportedMode)
            ));
            assert!(!recognizer.is_listening());
            assert!(rx.try_recv().is_err());
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_transcript() {
        let mut recognizer = CommandRecognizer::new(
            "sh",
            vec!["-c".to_string(), "echo \"  $AGENTMIND_SPEECH_LOCALE привіт  \"".to_string()],
            SpeechConfig::default(),
        );
        let (sink, rx) = channel_sink();
        recognizer.start(sink).unwrap();

        let events = collect(rx).await;
        assert_eq!(
            events,
            vec![
                SpeechEvent::Started,
                SpeechEvent::Transcript("uk-UA привіт".to_string()),
                SpeechEvent::Ended,
            ]
        );
        assert!(!recognizer.is_listening());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_failure_reports_error() {
        let mut recognizer = CommandRecognizer::new(
            "sh",
            vec!["-c".to_string(), "exit 3".to_string()],
            SpeechConfig::default(),
        );
        let (sink, rx) = channel_sink();
        recognizer.start(sink).unwrap();

        let events = collect(rx).await;
        assert_eq!(events.first(), Some(&SpeechEvent::Started));
        assert!(matches!(events.get(1), Some(SpeechEvent::Error(_))));
        assert_eq!(events.last(), Some(&SpeechEvent::Ended));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stop_kills_command() {
        let mut recognizer = CommandRecognizer::new(
            "sh",
            vec!["-c".to_string(), "sleep 30; echo late".to_string()],
            SpeechConfig::default(),
        );
        let (sink, rx) = channel_sink();
        recognizer.start(sink.clone()).unwrap();
        assert!(recognizer.is_listening());
        assert!(matches!(
            recognizer.start(sink),
            Err(SpeechError::AlreadyListening)
        ));

        recognizer.stop();
        assert!(!recognizer.is_listening());
        let events = collect(rx).await;
        assert_eq!(events, vec![SpeechEvent::Started, SpeechEvent::Ended]);
    }
}
