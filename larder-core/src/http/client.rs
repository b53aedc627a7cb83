//! Retrieval collaborators: the HTML relay, the readable-text relay, and a mock.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::config::Config;
use crate::error::FetchError;

use super::charset::decode_body;

/// Something that turns a page URL into text (HTML or readable text).
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, url: &str) -> Result<String, FetchError>;
}

/// How a target URL is routed through a public relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relay {
    /// Returns the raw page HTML; target appended percent-encoded.
    Html { prefix: String },
    /// Returns readable plain text; target appended as `scheme://host/path?query`.
    ReadableText { prefix: String },
}

impl Relay {
    /// Build the relay request URL for a target page.
    pub fn request_url(&self, target: &str) -> Result<String, FetchError> {
        let parsed = url::Url::parse(target).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl(format!(
                "unsupported scheme: {}",
                parsed.scheme()
            )));
        }

        match self {
            Relay::Html { prefix } => {
                let encoded: String = url::form_urlencoded::byte_serialize(target.as_bytes()).collect();
                Ok(format!("{}{}", prefix, encoded))
            }
            Relay::ReadableText { prefix } => {
                let host = parsed
                    .host_str()
                    .ok_or_else(|| FetchError::InvalidUrl(format!("no host in {}", target)))?;
                let mut out = format!("{}{}://{}", prefix, parsed.scheme(), host);
                if let Some(port) = parsed.port() {
                    out.push_str(&format!(":{}", port));
                }
                out.push_str(parsed.path());
                if let Some(query) = parsed.query() {
                    out.push('?');
                    out.push_str(query);
                }
                Ok(out)
            }
        }
    }
}

/// Production retriever: one reqwest client talking to one relay.
pub struct RelayClient {
    inner: reqwest::Client,
    relay: Relay,
}

impl RelayClient {
    pub fn new(relay: Relay, config: &Config) -> Result<Self, FetchError> {
        let inner = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;
        Ok(Self { inner, relay })
    }

    /// Client for the configured HTML relay.
    pub fn html(config: &Config) -> Result<Self, FetchError> {
        Self::new(
            Relay::Html {
                prefix: config.html_relay.clone(),
            },
            config,
        )
    }

    /// Client for the configured readable-text relay.
    pub fn readable_text(config: &Config) -> Result<Self, FetchError> {
        Self::new(
            Relay::ReadableText {
                prefix: config.text_relay.clone(),
            },
            config,
        )
    }
}

#[async_trait]
impl Retriever for RelayClient {
    async fn retrieve(&self, url: &str) -> Result<String, FetchError> {
        let request_url = self.relay.request_url(url)?;
        tracing::debug!(url, relay_url = %request_url, "network: fetching via relay");

        let response = self.inner.get(&request_url).send().await?;
        if !response.status().is_success() {
            tracing::debug!(url, status = %response.status(), "network: relay request failed");
            return Err(FetchError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let bytes = response.bytes().await?;

        Ok(decode_body(&bytes, content_type.as_deref()))
    }
}

/// Canned response for [`MockClient`].
#[derive(Debug, Clone)]
pub enum MockResponse {
    Text(String),
    Error(String),
}

/// Retriever returning canned per-URL responses, counting every call.
#[derive(Debug, Default)]
pub struct MockClient {
    responses: HashMap<String, MockResponse>,
    calls: AtomicUsize,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, url: &str, text: &str) -> Self {
        self.responses
            .insert(url.to_string(), MockResponse::Text(text.to_string()));
        self
    }

    pub fn with_error(mut self, url: &str, error: &str) -> Self {
        self.responses
            .insert(url.to_string(), MockResponse::Error(error.to_string()));
        self
    }

    /// Number of `retrieve` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Retriever for MockClient {
    async fn retrieve(&self, url: &str) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.responses.get(url) {
            Some(MockResponse::Text(text)) => Ok(text.clone()),
            Some(MockResponse::Error(e)) => Err(FetchError::Unavailable(e.clone())),
            None => Err(FetchError::Unavailable(format!(
                "No mock response for URL: {}",
                url
            ))),
        }
    }
}
