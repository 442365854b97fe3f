//! Playlist adapter: title from `h2.f-ff2.f-brk`, tracks from `playlist.tracks`.

use std::sync::LazyLock;

use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::debug;

use crate::api::MusicApi;

use super::{
    CollectionAdapter, CollectionError, CollectionKind, CollectionListing, collection_id,
    compile_static_selector, into_raw_tracks, select_text,
};

static TITLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector("h2.f-ff2.f-brk"));

/// Reads user playlists.
#[derive(Debug, Default)]
pub struct PlaylistAdapter;

impl PlaylistAdapter {
    /// Creates a new `PlaylistAdapter`.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CollectionAdapter for PlaylistAdapter {
    fn kind(&self) -> CollectionKind {
        CollectionKind::Playlist
    }

    fn title(&self, page: &Html) -> String {
        select_text(page, &TITLE_SELECTOR)
    }

    #[tracing::instrument(skip(self, api), fields(adapter = "playlist"))]
    async fn tracks(
        &self,
        api: &dyn MusicApi,
        url: &str,
    ) -> Result<CollectionListing, CollectionError> {
        let id = collection_id(url)?;
        let detail = api
            .fetch_playlist(id)
            .await
            .map_err(|source| CollectionError::metadata(CollectionKind::Playlist, id, source))?;
        let playlist = detail.playlist;
        debug!(id, tracks = playlist.tracks.len(), "playlist listing unwrapped");
        Ok(CollectionListing {
            name: playlist.name,
            tracks: into_raw_tracks(playlist.tracks),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_playlist_adapter_kind() {
        assert_eq!(PlaylistAdapter::new().kind(), CollectionKind::Playlist);
    }

    #[test]
    fn test_playlist_title_requires_brk_class() {
        let page = Html::parse_document(
            r#"<div><h2 class="f-ff2">Album-ish</h2><h2 class="f-ff2 f-brk">Chill Vibes</h2></div>"#,
        );
        assert_eq!(PlaylistAdapter::new().title(&page), "Chill Vibes");
    }

    #[tokio::test]
    async fn test_playlist_tracks_rejects_url_without_id() {
        let api = crate::test_support::FakeApi::default();
        let result = PlaylistAdapter::new()
            .tracks(&api, "http://music.163.com/playlist")
            .await;
        assert!(matches!(result, Err(CollectionError::MissingId { .. })));
        assert_eq!(api.playlist_calls(), 0);
    }

    #[tokio::test]
    async fn test_playlist_tracks_unwraps_nested_list() {
        let api = crate::test_support::FakeApi::default().with_playlist(
            7,
            "Chill",
            &[(1, "Rainy Day", "Aoi"), (2, "Sunny", "Ben")],
        );
        let listing = PlaylistAdapter::new()
            .tracks(&api, "http://music.163.com/playlist?id=7")
            .await
            .unwrap();
        assert_eq!(listing.name, "Chill");
        assert_eq!(listing.tracks.len(), 2);
        assert_eq!(listing.tracks[1].name, "Sunny");
        assert_eq!(listing.tracks[1].position, 2);
        assert_eq!(api.playlist_calls(), 1);
    }
}
