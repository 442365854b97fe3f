//! Collection classification and per-kind listing adapters.
//!
//! # Architecture
//!
//! - [`CollectionKind`] - Closed set of supported collection kinds
//! - [`CollectionAdapter`] - Async trait each kind implements (title + tracks)
//! - [`AdapterRegistry`] - Kind-to-adapter table used by the pipeline
//! - [`PlaylistAdapter`] / [`AlbumAdapter`] - The two registered kinds
//!
//! # Example
//!
//! ```
//! use yun_core::collection::{CollectionKind, normalize_url};
//!
//! let url = normalize_url("https://music.163.com/#/playlist?id=12583200");
//! assert_eq!(url, "https://music.163.com/playlist?id=12583200");
//! assert_eq!(CollectionKind::classify(&url).unwrap(), CollectionKind::Playlist);
//! ```

mod album;
mod error;
mod playlist;
mod registry;

pub use album::AlbumAdapter;
pub use error::CollectionError;
pub use playlist::PlaylistAdapter;
pub use registry::{AdapterRegistry, build_default_adapter_registry};

use std::fmt;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

use crate::api::{ApiSong, MusicApi};
use crate::track::RawTrack;

/// Supported collection kinds, in classification order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    /// A user playlist.
    Playlist,
    /// A released album.
    Album,
}

impl CollectionKind {
    /// Every kind in declaration order; classification returns the first match.
    pub const ALL: [Self; 2] = [Self::Playlist, Self::Album];

    /// Machine key, also the substring looked for in URLs.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Playlist => "playlist",
            Self::Album => "album",
        }
    }

    /// Display label used by the `:typeText` template token.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Playlist => "列表",
            Self::Album => "专辑",
        }
    }

    /// Classifies a URL by the first kind key it contains.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::Unsupported`] when no key matches.
    pub fn classify(url: &str) -> Result<Self, CollectionError> {
        Self::ALL
            .into_iter()
            .find(|kind| url.contains(kind.key()))
            .ok_or_else(|| CollectionError::unsupported(url))
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A collection's service-side name and ordered tracks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionListing {
    /// Name reported by the metadata service.
    pub name: String,
    /// Tracks with 1-based positions in collection order.
    pub tracks: Vec<RawTrack>,
}

/// Per-kind strategy for reading a collection.
///
/// Variants differ only in the title selector and in which service call they
/// issue and how they unwrap its payload.
///
/// # Object Safety
///
/// Uses `async_trait` to support `Box<dyn CollectionAdapter>` in the registry.
#[async_trait]
pub trait CollectionAdapter: Send + Sync {
    /// The kind this adapter handles.
    fn kind(&self) -> CollectionKind;

    /// Extracts the display title from the collection page.
    fn title(&self, page: &Html) -> String;

    /// Fetches the ordered track listing for the collection at `url`.
    ///
    /// Service failures propagate unchanged; nothing is retried here.
    async fn tracks(
        &self,
        api: &dyn MusicApi,
        url: &str,
    ) -> Result<CollectionListing, CollectionError>;
}

static HASH_ROUTE_RE: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"(https?:.*?/)#/"));

fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

/// Compiles a CSS selector at static init; panics on invalid pattern.
pub(crate) fn compile_static_selector(pattern: &str) -> Selector {
    Selector::parse(pattern).unwrap_or_else(|e| panic!("invalid static selector '{pattern}': {e}"))
}

/// Removes the `#/` hash route the web player puts in shared links.
#[must_use]
pub fn normalize_url(url: &str) -> String {
    HASH_ROUTE_RE.replace(url.trim(), "$1").into_owned()
}

/// Parses the numeric `id` query parameter out of a collection URL.
///
/// # Errors
///
/// Returns [`CollectionError::MissingId`] when the URL does not parse or has
/// no numeric `id`.
pub fn collection_id(url: &str) -> Result<u64, CollectionError> {
    Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .query_pairs()
                .find(|(key, _)| key == "id")
                .and_then(|(_, value)| value.trim().parse::<u64>().ok())
        })
        .ok_or_else(|| CollectionError::missing_id(url))
}

/// Returns the trimmed text of the first element matching `selector`.
pub(crate) fn select_text(page: &Html, selector: &Selector) -> String {
    page.select(selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// Converts service songs into raw tracks, numbering them from 1.
pub(crate) fn into_raw_tracks(songs: Vec<ApiSong>) -> Vec<RawTrack> {
    songs
        .into_iter()
        .enumerate()
        .map(|(index, song)| RawTrack {
            id: song.id,
            name: song.name,
            artists: song.ar.into_iter().map(|artist| artist.name).collect(),
            position: index + 1,
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::ApiArtist;

    #[test]
    fn test_classify_playlist_and_album() {
        assert_eq!(
            CollectionKind::classify("http://music.163.com/playlist?id=1").unwrap(),
            CollectionKind::Playlist
        );
        assert_eq!(
            CollectionKind::classify("http://music.163.com/album?id=1").unwrap(),
            CollectionKind::Album
        );
    }

    #[test]
    fn test_classify_unknown_kind_fails() {
        let result = CollectionKind::classify("http://music.163.com/song?id=1");
        assert!(matches!(result, Err(CollectionError::Unsupported { .. })));
    }

    #[test]
    fn test_classify_first_declared_wins() {
        assert_eq!(
            CollectionKind::classify("http://x/album/playlist?id=1").unwrap(),
            CollectionKind::Playlist
        );
    }

    #[test]
    fn test_kind_keys_and_labels() {
        assert_eq!(CollectionKind::Playlist.key(), "playlist");
        assert_eq!(CollectionKind::Album.key(), "album");
        assert_eq!(CollectionKind::Playlist.label(), "列表");
        assert_eq!(CollectionKind::Album.label(), "专辑");
        assert_eq!(CollectionKind::Album.to_string(), "album");
    }

    #[test]
    fn test_normalize_url_strips_hash_route() {
        assert_eq!(
            normalize_url("http://music.163.com/#/playlist?id=12583200"),
            "http://music.163.com/playlist?id=12583200"
        );
        assert_eq!(
            normalize_url("  https://music.163.com/album?id=3  "),
            "https://music.163.com/album?id=3"
        );
    }

    #[test]
    fn test_collection_id_parses_query() {
        assert_eq!(
            collection_id("http://music.163.com/playlist?id=12583200&userid=9").unwrap(),
            12_583_200
        );
    }

    #[test]
    fn test_collection_id_missing_or_invalid() {
        assert!(matches!(
            collection_id("http://music.163.com/playlist"),
            Err(CollectionError::MissingId { .. })
        ));
        assert!(matches!(
            collection_id("http://music.163.com/playlist?id=abc"),
            Err(CollectionError::MissingId { .. })
        ));
        assert!(collection_id("not a url").is_err());
    }

    #[test]
    fn test_select_text_trims_first_match() {
        let page = Html::parse_document(
            r#"<html><body><h2 class="f-ff2"> First </h2><h2 class="f-ff2">Second</h2></body></html>"#,
        );
        let selector = compile_static_selector("h2.f-ff2");
        assert_eq!(select_text(&page, &selector), "First");
    }

    #[test]
    fn test_select_text_missing_is_empty() {
        let page = Html::parse_document("<html><body></body></html>");
        let selector = compile_static_selector("h2.f-ff2");
        assert_eq!(select_text(&page, &selector), "");
    }

    #[test]
    fn test_into_raw_tracks_numbers_from_one() {
        let songs = vec![
            ApiSong {
                id: 10,
                name: "a".to_string(),
                ar: vec![ApiArtist {
                    name: "x".to_string(),
                }],
            },
            ApiSong {
                id: 20,
                name: "b".to_string(),
                ar: vec![],
            },
        ];
        let tracks = into_raw_tracks(songs);
        assert_eq!(tracks[0].position, 1);
        assert_eq!(tracks[1].position, 2);
        assert_eq!(tracks[0].artists, vec!["x".to_string()]);
        assert!(tracks[1].artists.is_empty());
    }
}
