//! Connection settings for the agent backend.

use serde::{Deserialize, Serialize};

/// Local development backend.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Environment variable overriding the backend base URL.
pub const API_BASE_URL_ENV: &str = "AGENTMIND_API_BASE_URL";

pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 60_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub request_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl ClientConfig {
    pub fn new(api_base_url: impl Into<String>, request_timeout_ms: u64) -> Self {
        Self {
            api_base_url: normalize_base_url(&api_base_url.into()),
            request_timeout_ms,
        }
    }

    /// Default timeout, base URL from the environment override when present.
    pub fn from_env() -> Self {
        let configured = std::env::var(API_BASE_URL_ENV).ok();
        Self::new(
            resolve_base_url(configured.as_deref(), None),
            DEFAULT_REQUEST_TIMEOUT_MS,
        )
    }
}

/// Pick the effective base URL.
///
/// A non-blank environment value wins over the configured one, which wins
/// over [`DEFAULT_API_BASE_URL`].
pub fn resolve_base_url(env_value: Option<&str>, configured: Option<&str>) -> String {
    let chosen = [env_value, configured]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|value| !value.is_empty())
        .unwrap_or(DEFAULT_API_BASE_URL);
    normalize_base_url(chosen)
}

/// Strip surrounding whitespace and trailing slashes.
pub fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_base_url() {
        assert_eq!(resolve_base_url(None, None), "http://localhost:8000");
    }

    #[test]
    fn test_env_overrides_configured() {
        assert_eq!(
            resolve_base_url(Some("https://agent.example/"), Some("http://other")),
            "https://agent.example"
        );
    }

    #[test]
    fn test_blank_env_is_ignored() {
        assert_eq!(
            resolve_base_url(Some("   "), Some("http://configured//")),
            "http://configured"
        );
        assert_eq!(resolve_base_url(Some(""), None), DEFAULT_API_BASE_URL);
    }

    #[test]
    fn test_new_normalizes() {
        let config = ClientConfig::new(" http://host:9000/ ", 10);
        assert_eq!(config.api_base_url, "http://host:9000");
        assert_eq!(config.request_timeout_ms, 10);
    }
}
