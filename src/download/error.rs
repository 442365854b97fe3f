//! Error types for track transfers.

use std::path::PathBuf;

use thiserror::Error;

/// Why a single transfer attempt failed.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network-level error (DNS, connection refused, TLS, reset mid-stream).
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL being downloaded.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The attempt exceeded its time budget.
    #[error("timeout downloading {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Non-success HTTP response.
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// Creating directories or writing the destination failed.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The path being written.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The playback URL does not parse.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
    },

    /// The run was cancelled while the transfer was in flight.
    #[error("download of {url} cancelled")]
    Cancelled {
        /// The URL whose transfer was aborted.
        url: String,
    },
}

impl DownloadError {
    /// Creates a network error, promoting reqwest timeouts to [`Self::Timeout`].
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            return Self::timeout(url);
        }
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a cancellation error.
    pub fn cancelled(url: impl Into<String>) -> Self {
        Self::Cancelled { url: url.into() }
    }
}

// No `From<reqwest::Error>` / `From<std::io::Error>`: every variant needs the
// URL or path that the source error does not carry.

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_error_timeout_display() {
        let error = DownloadError::timeout("http://m.example/a.mp3");
        let msg = error.to_string();
        assert!(msg.contains("timeout"), "{msg}");
        assert!(msg.contains("http://m.example/a.mp3"), "{msg}");
    }

    #[test]
    fn test_download_error_http_status_display() {
        let msg = DownloadError::http_status("http://m.example/a.mp3", 503).to_string();
        assert_eq!(msg, "HTTP 503 downloading http://m.example/a.mp3");
    }

    #[test]
    fn test_download_error_io_display() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let msg = DownloadError::io(PathBuf::from("/tmp/a.mp3"), io_error).to_string();
        assert!(msg.contains("/tmp/a.mp3"), "{msg}");
        assert!(msg.contains("access denied"), "{msg}");
    }

    #[test]
    fn test_download_error_invalid_url_and_cancelled_display() {
        assert_eq!(
            DownloadError::invalid_url("nope").to_string(),
            "invalid URL: nope"
        );
        assert!(
            DownloadError::cancelled("http://x/a.mp3")
                .to_string()
                .contains("cancelled")
        );
    }
}
