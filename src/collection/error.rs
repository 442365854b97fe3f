//! Error types for collection classification and listing.

use thiserror::Error;

use crate::api::ApiError;

use super::CollectionKind;

/// Errors raised while identifying a collection or fetching its listing.
///
/// All variants are fatal to a run.
#[derive(Debug, Error)]
pub enum CollectionError {
    /// The URL names no registered collection kind.
    #[error(
        "unsupported collection type for '{url}'\n  Suggestion: pass a playlist or album page URL"
    )]
    Unsupported {
        /// The offending URL.
        url: String,
    },

    /// The URL carries no numeric `id` query parameter.
    #[error("no collection id in '{url}'\n  Suggestion: the URL must contain '?id=<number>'")]
    MissingId {
        /// The offending URL.
        url: String,
    },

    /// The metadata service call for the collection failed.
    #[error("failed to fetch {kind} {id}: {source}")]
    Metadata {
        /// Collection kind being fetched.
        kind: CollectionKind,
        /// Collection id being fetched.
        id: u64,
        /// The underlying API error.
        #[source]
        source: ApiError,
    },
}

impl CollectionError {
    /// Creates an `Unsupported` error.
    #[must_use]
    pub fn unsupported(url: &str) -> Self {
        Self::Unsupported {
            url: url.to_string(),
        }
    }

    /// Creates a `MissingId` error.
    #[must_use]
    pub fn missing_id(url: &str) -> Self {
        Self::MissingId {
            url: url.to_string(),
        }
    }

    /// Wraps an API failure with the collection it was fetching.
    #[must_use]
    pub fn metadata(kind: CollectionKind, id: u64, source: ApiError) -> Self {
        Self::Metadata { kind, id, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_display_names_url() {
        let msg = CollectionError::unsupported("https://music.163.com/song?id=1").to_string();
        assert!(msg.contains("unsupported collection type"), "{msg}");
        assert!(msg.contains("song?id=1"), "{msg}");
    }

    #[test]
    fn test_metadata_display_names_kind_and_id() {
        let error = CollectionError::metadata(
            CollectionKind::Album,
            42,
            ApiError::http_status("/api/v1/album/42", 500),
        );
        let msg = error.to_string();
        assert!(msg.contains("album 42"), "{msg}");
        assert!(msg.contains("HTTP 500"), "{msg}");
    }
}
