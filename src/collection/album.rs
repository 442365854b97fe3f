//! Album adapter: title from `h2.f-ff2`, tracks from top-level `songs`.

use std::sync::LazyLock;

use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::debug;

use crate::api::MusicApi;

use super::{
    CollectionAdapter, CollectionError, CollectionKind, CollectionListing, collection_id,
    compile_static_selector, into_raw_tracks, select_text,
};

static TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| compile_static_selector("h2.f-ff2"));

/// Reads released albums.
#[derive(Debug, Default)]
pub struct AlbumAdapter;

impl AlbumAdapter {
    /// Creates a new `AlbumAdapter`.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CollectionAdapter for AlbumAdapter {
    fn kind(&self) -> CollectionKind {
        CollectionKind::Album
    }

    fn title(&self, page: &Html) -> String {
        select_text(page, &TITLE_SELECTOR)
    }

    #[tracing::instrument(skip(self, api), fields(adapter = "album"))]
    async fn tracks(
        &self,
        api: &dyn MusicApi,
        url: &str,
    ) -> Result<CollectionListing, CollectionError> {
        let id = collection_id(url)?;
        let detail = api
            .fetch_album(id)
            .await
            .map_err(|source| CollectionError::metadata(CollectionKind::Album, id, source))?;
        debug!(id, tracks = detail.songs.len(), "album listing unwrapped");
        Ok(CollectionListing {
            name: detail.album.name,
            tracks: into_raw_tracks(detail.songs),
        })
    }
}
