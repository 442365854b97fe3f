//! Error types for metadata and playback-URL lookups.

use thiserror::Error;

/// Errors raised by a [`MusicApi`](super::MusicApi) call.
///
/// These are never retried by the pipeline: a failed metadata lookup aborts
/// the whole run.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure (DNS, connection refused, TLS).
    #[error("network error calling {endpoint}: {source}")]
    Network {
        /// Endpoint path that was called.
        endpoint: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out.
    #[error("timeout calling {endpoint}")]
    Timeout {
        /// Endpoint path that was called.
        endpoint: String,
    },

    /// Non-success HTTP status.
    #[error("HTTP {status} calling {endpoint}")]
    HttpStatus {
        /// Endpoint path that was called.
        endpoint: String,
        /// HTTP status code.
        status: u16,
    },

    /// Response body did not match the expected shape.
    #[error("unexpected response from {endpoint}: {source}")]
    Decode {
        /// Endpoint path that was called.
        endpoint: String,
        /// The JSON decoding error.
        #[source]
        source: serde_json::Error,
    },

    /// The service answered with a non-200 status code in its JSON envelope.
    #[error("{endpoint} returned code {code}: {message}")]
    Service {
        /// Endpoint path that was called.
        endpoint: String,
        /// Service status code.
        code: i64,
        /// Service message, or a placeholder when absent.
        message: String,
    },
}

impl ApiError {
    /// Creates a transport error, promoting timeouts to [`ApiError::Timeout`].
    pub fn network(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            return Self::Timeout {
                endpoint: endpoint.into(),
            };
        }
        Self::Network {
            endpoint: endpoint.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(endpoint: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            endpoint: endpoint.into(),
            status,
        }
    }

    /// Creates a decoding error.
    pub fn decode(endpoint: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            endpoint: endpoint.into(),
            source,
        }
    }

    /// Creates a service-envelope error.
    pub fn service(endpoint: impl Into<String>, code: i64, message: Option<String>) -> Self {
        Self::Service {
            endpoint: endpoint.into(),
            code,
            message: message.unwrap_or_else(|| "no message".to_string()),
        }
    }
}
