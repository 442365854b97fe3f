//! Shared HTTP client construction.
//!
//! Header and timeout policy lives in an explicit [`HttpSettings`] value that
//! the caller builds once and hands down to the page fetcher, the API client
//! and the downloader. Nothing here is process-global.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, REFERER};
use reqwest::{Client, ClientBuilder};
use tracing::debug;

use crate::user_agent::{BROWSER_USER_AGENT, SITE_REFERER};

/// Default connect timeout (30 seconds).
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default timeout for page and API requests (30 seconds).
///
/// Download transfers are bounded per attempt by the downloader instead.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Header and timeout configuration for every outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    /// User-Agent header value.
    pub user_agent: String,
    /// Referer header value.
    pub referer: String,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            user_agent: BROWSER_USER_AGENT.to_string(),
            referer: SITE_REFERER.to_string(),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}

impl HttpSettings {
    /// Returns settings with a custom connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// Builds a client carrying these headers and timeouts.
    ///
    /// # Errors
    ///
    /// Returns the builder error when the User-Agent is not a valid header
    /// value or the TLS backend cannot be initialized. An invalid referer is
    /// left out.
    pub fn build_client(&self) -> Result<Client, reqwest::Error> {
        debug!(
            connect_timeout_ms = self.connect_timeout.as_millis(),
            "building HTTP client"
        );
        base_client_builder(self).build()
    }
}

fn base_client_builder(settings: &HttpSettings) -> ClientBuilder {
    let mut headers = HeaderMap::new();
    if let Ok(referer) = HeaderValue::from_str(&settings.referer) {
        headers.insert(REFERER, referer);
    }
    Client::builder()
        .connect_timeout(settings.connect_timeout)
        .gzip(true)
        .user_agent(settings.user_agent.clone())
        .default_headers(headers)
}
