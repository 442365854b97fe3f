//! In-memory [`MusicApi`] used by unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::api::{
    AlbumDetail, ApiAlbum, ApiArtist, ApiError, ApiPlaylist, ApiSong, MusicApi, PlaylistDetail,
};
use crate::track::{PlaybackResult, Quality};

/// Serves canned playlists, albums and playback URLs, counting calls.
///
/// Unknown collections answer with a service code 404.
#[derive(Debug, Default)]
pub(crate) struct FakeApi {
    playlists: HashMap<u64, PlaylistDetail>,
    albums: HashMap<u64, AlbumDetail>,
    playback: HashMap<u64, Option<String>>,
    playlist_calls: AtomicUsize,
    album_calls: AtomicUsize,
    playback_calls: AtomicUsize,
    last_playback_request: Mutex<Option<(Vec<u64>, Quality)>>,
}

fn songs(entries: &[(u64, &str, &str)]) -> Vec<ApiSong> {
    entries
        .iter()
        .map(|(id, name, singer)| ApiSong {
            id: *id,
            name: (*name).to_string(),
            ar: vec![ApiArtist {
                name: (*singer).to_string(),
            }],
        })
        .collect()
}

impl FakeApi {
    pub(crate) fn with_playlist(
        mut self,
        id: u64,
        name: &str,
        entries: &[(u64, &str, &str)],
    ) -> Self {
        self.playlists.insert(
            id,
            PlaylistDetail {
                playlist: ApiPlaylist {
                    name: name.to_string(),
                    tracks: songs(entries),
                },
            },
        );
        self
    }

    pub(crate) fn with_album(
        mut self,
        id: u64,
        name: &str,
        entries: &[(u64, &str, &str)],
    ) -> Self {
        self.albums.insert(
            id,
            AlbumDetail {
                album: ApiAlbum {
                    name: name.to_string(),
                },
                songs: songs(entries),
            },
        );
        self
    }

    /// Registers a playback entry; `None` models an unlicensed track the
    /// service still lists.
    pub(crate) fn with_playback(mut self, id: u64, url: Option<&str>) -> Self {
        self.playback.insert(id, url.map(str::to_string));
        self
    }

    pub(crate) fn playlist_calls(&self) -> usize {
        self.playlist_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn album_calls(&self) -> usize {
        self.album_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn playback_calls(&self) -> usize {
        self.playback_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_playback_request(&self) -> Option<(Vec<u64>, Quality)> {
        self.last_playback_request
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl MusicApi for FakeApi {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn fetch_playlist(&self, id: u64) -> Result<PlaylistDetail, ApiError> {
        self.playlist_calls.fetch_add(1, Ordering::SeqCst);
        self.playlists
            .get(&id)
            .cloned()
            .ok_or_else(|| ApiError::service("/api/v6/playlist/detail", 404, None))
    }

    async fn fetch_album(&self, id: u64) -> Result<AlbumDetail, ApiError> {
        self.album_calls.fetch_add(1, Ordering::SeqCst);
        self.albums
            .get(&id)
            .cloned()
            .ok_or_else(|| ApiError::service(format!("/api/v1/album/{id}"), 404, None))
    }

    async fn fetch_playback_urls(
        &self,
        ids: &[u64],
        quality: Quality,
    ) -> Result<Vec<PlaybackResult>, ApiError> {
        self.playback_calls.fetch_add(1, Ordering::SeqCst);
        *self
            .last_playback_request
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some((ids.to_vec(), quality));
        Ok(ids
            .iter()
            .filter_map(|id| {
                self.playback.get(id).map(|url| PlaybackResult {
                    id: *id,
                    url: url.clone(),
                })
            })
            .collect())
    }
}
