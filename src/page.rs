//! Collection page download.

use std::time::Duration;

use reqwest::Client;
use thiserror::Error;
use tracing::{debug, instrument};

/// Errors fetching a collection page.
#[derive(Debug, Error)]
pub enum PageError {
    /// Transport failure.
    #[error("network error fetching {url}: {source}")]
    Network {
        /// Page URL.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The request did not complete in time.
    #[error("timeout fetching {url}")]
    Timeout {
        /// Page URL.
        url: String,
    },

    /// Non-success HTTP response.
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// Page URL.
        url: String,
        /// The HTTP status code.
        status: u16,
    },
}

impl PageError {
    /// Creates a network error, promoting reqwest timeouts to [`Self::Timeout`].
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            return Self::Timeout { url: url.into() };
        }
        Self::Network {
            url: url.into(),
            source,
        }
    }
}

/// Downloads the HTML of `url` through the shared client.
///
/// # Errors
///
/// Returns [`PageError`] on transport failure, timeout or non-2xx status.
#[instrument(skip(client))]
pub async fn fetch_markup(
    client: &Client,
    url: &str,
    timeout: Duration,
) -> Result<String, PageError> {
    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| PageError::network(url, e))?;
    let status = response.status();
    if !status.is_success() {
        return Err(PageError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    let markup = response
        .text()
        .await
        .map_err(|e| PageError::network(url, e))?;
    debug!(bytes = markup.len(), "fetched collection page");
    Ok(markup)
}
