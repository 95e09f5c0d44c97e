//! Configuration loading for the AgentMind TUI.
//!
//! The config file is optional. Missing fields take the built-in defaults,
//! unknown fields are rejected.

use agentmind_client::config::{resolve_base_url, DEFAULT_REQUEST_TIMEOUT_MS};
use agentmind_client::{ClientConfig, SpeechConfig, API_BASE_URL_ENV};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_PATH_ENV: &str = "AGENTMIND_TUI_CONFIG";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TuiConfig {
    /// Backend base URL; `AGENTMIND_API_BASE_URL` takes precedence.
    pub api_base_url: Option<String>,
    pub request_timeout_ms: u64,
    pub settings_path: PathBuf,
    pub log_path: PathBuf,
    pub tick_ms: u64,
    pub theme: ThemeConfig,
    pub health: HealthConfig,
    pub speech: SpeechCommandConfig,
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self {
            api_base_url: None,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            settings_path: PathBuf::from(".agentmind/settings.json"),
            log_path: PathBuf::from(".agentmind/agentmind-tui.log"),
            tick_ms: 250,
            theme: ThemeConfig::default(),
            health: HealthConfig::default(),
            speech: SpeechCommandConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThemeConfig {
    pub name: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            name: "synthbrute".to_string(),
        }
    }
}

/// Readiness polling. Backoff applies only while the backend is not ready.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HealthConfig {
    pub initial_ms: u64,
    pub max_ms: u64,
    pub multiplier: f64,
    pub jitter_ms: u64,
    /// Poll interval once the backend reports ready.
    pub interval_ms: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            initial_ms: 500,
            max_ms: 30_000,
            multiplier: 2.0,
            jitter_ms: 250,
            interval_ms: 30_000,
        }
    }
}

/// External speech-to-text command. Voice input is unavailable without one.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpeechCommandConfig {
    pub command: Option<String>,
    pub args: Vec<String>,
    pub locale: String,
}

impl Default for SpeechCommandConfig {
    fn default() -> Self {
        Self {
            command: None,
            args: Vec::new(),
            locale: SpeechConfig::default().locale,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl TuiConfig {
    /// Load from `--config <path>` or `AGENTMIND_TUI_CONFIG`, else defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let config = match config_path_from_args().or_else(config_path_from_env) {
            Some(path) => Self::from_path(&path)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.api_base_url {
            if url.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "api_base_url",
                    reason: "must not be empty when set".to_string(),
                });
            }
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.tick_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "tick_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.settings_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "settings_path",
                reason: "must not be empty".to_string(),
            });
        }
        if self.log_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "log_path",
                reason: "must not be empty".to_string(),
            });
        }
        if self.theme.name.to_ascii_lowercase() != "synthbrute" {
            return Err(ConfigError::InvalidValue {
                field: "theme.name",
                reason: "only 'synthbrute' is supported".to_string(),
            });
        }
        if self.health.initial_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "health.initial_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.health.max_ms < self.health.initial_ms {
            return Err(ConfigError::InvalidValue {
                field: "health.max_ms",
                reason: "must be >= initial_ms".to_string(),
            });
        }
        if self.health.multiplier < 1.0 {
            return Err(ConfigError::InvalidValue {
                field: "health.multiplier",
                reason: "must be >= 1.0".to_string(),
            });
        }
        if self.health.interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "health.interval_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if let Some(command) = &self.speech.command {
            if command.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "speech.command",
                    reason: "must not be empty when set".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Client settings with the environment override applied.
    pub fn client_config(&self) -> ClientConfig {
        let env_value = std::env::var(API_BASE_URL_ENV).ok();
        self.client_config_with(env_value.as_deref())
    }

    pub fn client_config_with(&self, env_value: Option<&str>) -> ClientConfig {
        ClientConfig::new(
            resolve_base_url(env_value, self.api_base_url.as_deref()),
            self.request_timeout_ms,
        )
    }

    pub fn speech_config(&self) -> SpeechConfig {
        SpeechConfig {
            locale: self.speech.locale.clone(),
            ..SpeechConfig::default()
        }
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from)
}

fn config_path_from_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}
