//! Runtime configuration, seeded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

/// Default HTML relay; the target URL is appended percent-encoded.
pub const DEFAULT_HTML_RELAY: &str = "https://api.allorigins.win/raw?url=";

/// Default readable-text relay; the target is appended as `scheme://host/path?query`.
pub const DEFAULT_TEXT_RELAY: &str = "https://r.jina.ai/";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the local store files.
    pub data_dir: PathBuf,
    pub html_relay: String,
    pub text_relay: String,
    /// Per-request timeout for both relays.
    pub timeout: Duration,
    pub user_agent: String,
    /// Use minimal key-derivation cost. Never for real vaults.
    pub insecure_kdf: bool,
}

impl Config {
    /// Configuration from the environment with defaults for anything unset.
    pub fn from_env() -> Self {
        ConfigBuilder::new().build()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    data_dir: PathBuf,
    html_relay: String,
    text_relay: String,
    timeout: Duration,
    user_agent: String,
    insecure_kdf: bool,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    /// Create a builder from environment variables.
    ///
    /// - `LARDER_DATA_DIR`: store directory (default `~/.larder`)
    /// - `LARDER_HTML_RELAY`: HTML relay prefix
    /// - `LARDER_TEXT_RELAY`: readable-text relay prefix
    /// - `LARDER_HTTP_TIMEOUT_SECS`: request timeout in seconds (default 30)
    /// - `INSECURE_PASSWORD_HASHING`: any value enables fast key derivation
    pub fn new() -> Self {
        let data_dir = std::env::var("LARDER_DATA_DIR")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);

        let html_relay =
            std::env::var("LARDER_HTML_RELAY").unwrap_or_else(|_| DEFAULT_HTML_RELAY.to_string());
        let text_relay =
            std::env::var("LARDER_TEXT_RELAY").unwrap_or_else(|_| DEFAULT_TEXT_RELAY.to_string());

        let timeout_secs = std::env::var("LARDER_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Self {
            data_dir,
            html_relay,
            text_relay,
            timeout: Duration::from_secs(timeout_secs),
            user_agent: format!("Mozilla/5.0 (compatible; Larder/{})", env!("CARGO_PKG_VERSION")),
            insecure_kdf: std::env::var("INSECURE_PASSWORD_HASHING").is_ok(),
        }
    }

    pub fn data_dir(mut self, dir: PathBuf) -> Self {
        self.data_dir = dir;
        self
    }

    pub fn html_relay(mut self, prefix: impl Into<String>) -> Self {
        self.html_relay = prefix.into();
        self
    }

    pub fn text_relay(mut self, prefix: impl Into<String>) -> Self {
        self.text_relay = prefix.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn insecure_kdf(mut self, insecure: bool) -> Self {
        self.insecure_kdf = insecure;
        self
    }

    pub fn build(self) -> Config {
        Config {
            data_dir: self.data_dir,
            html_relay: self.html_relay,
            text_relay: self.text_relay,
            timeout: self.timeout,
            user_agent: self.user_agent,
            insecure_kdf: self.insecure_kdf,
        }
    }
}

/// `~/.larder`, or `data/larder` when there is no home directory.
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".larder"))
        .unwrap_or_else(|| PathBuf::from("data/larder"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_take_effect() {
        let config = ConfigBuilder::new()
            .data_dir(PathBuf::from("/tmp/larder-test"))
            .html_relay("http://localhost:1/raw?url=")
            .text_relay("http://localhost:2/")
            .timeout(Duration::from_secs(5))
            .insecure_kdf(true)
            .build();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/larder-test"));
        assert_eq!(config.html_relay, "http://localhost:1/raw?url=");
        assert_eq!(config.text_relay, "http://localhost:2/");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert!(config.insecure_kdf);
    }
}
