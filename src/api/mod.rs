//! Metadata and playback-URL service boundary.
//!
//! The pipeline only talks to the service through the [`MusicApi`] trait:
//! collection adapters call [`MusicApi::fetch_playlist`] or
//! [`MusicApi::fetch_album`], and the reconciler issues a single batched
//! [`MusicApi::fetch_playback_urls`] per collection. [`NeteaseApi`] is the
//! HTTP implementation; tests substitute in-memory fakes.

mod error;
mod netease;

pub use error::ApiError;
pub use netease::{DEFAULT_BASE_URL, NeteaseApi};

use async_trait::async_trait;
use serde::Deserialize;

use crate::track::{PlaybackResult, Quality};

/// An artist credit on a song.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ApiArtist {
    /// Artist name; null names decode as empty.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

/// A song as listed inside a playlist or album payload.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ApiSong {
    /// Track identifier.
    pub id: u64,
    /// Track title.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Artist credits (`ar` in newer payloads, `artists` in older ones).
    #[serde(default, alias = "artists")]
    pub ar: Vec<ApiArtist>,
}

/// Playlist body of a playlist detail response.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ApiPlaylist {
    /// Playlist title.
    #[serde(default)]
    pub name: String,
    /// Ordered tracks.
    #[serde(default)]
    pub tracks: Vec<ApiSong>,
}

/// Playlist detail response: tracks nested under `playlist.tracks`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PlaylistDetail {
    /// The playlist.
    pub playlist: ApiPlaylist,
}

/// Album body of an album detail response.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ApiAlbum {
    /// Album title.
    #[serde(default)]
    pub name: String,
}

/// Album detail response: tracks at the top level under `songs`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AlbumDetail {
    /// The album.
    #[serde(default)]
    pub album: ApiAlbum,
    /// Ordered tracks.
    #[serde(default)]
    pub songs: Vec<ApiSong>,
}

/// Access to the music service.
///
/// # Object Safety
///
/// Uses `async_trait` so the pipeline can hold an `Arc<dyn MusicApi>`.
#[async_trait]
pub trait MusicApi: Send + Sync {
    /// Returns a short name for logging.
    fn name(&self) -> &str;

    /// Fetches a playlist with its ordered track list.
    async fn fetch_playlist(&self, id: u64) -> Result<PlaylistDetail, ApiError>;

    /// Fetches an album with its ordered track list.
    async fn fetch_album(&self, id: u64) -> Result<AlbumDetail, ApiError>;

    /// Looks up playable URLs for a batch of track ids in one call.
    ///
    /// Entries for unlicensed tracks may be missing or carry no URL.
    async fn fetch_playback_urls(
        &self,
        ids: &[u64],
        quality: Quality,
    ) -> Result<Vec<PlaybackResult>, ApiError>;
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_song_accepts_ar_and_artists() {
        let new_shape: ApiSong =
            serde_json::from_str(r#"{"id": 1, "name": "a", "ar": [{"name": "x"}]}"#).unwrap();
        let old_shape: ApiSong =
            serde_json::from_str(r#"{"id": 1, "name": "a", "artists": [{"name": "x"}]}"#)
                .unwrap();
        assert_eq!(new_shape, old_shape);
        assert_eq!(new_shape.ar[0].name, "x");
    }

    #[test]
    fn test_song_tolerates_null_names() {
        let song: ApiSong =
            serde_json::from_str(r#"{"id": 9, "name": null, "ar": [{"name": null}]}"#).unwrap();
        assert_eq!(song.name, "");
        assert_eq!(song.ar[0].name, "");
    }

    #[test]
    fn test_playlist_detail_nested_tracks() {
        let detail: PlaylistDetail = serde_json::from_str(
            r#"{"code": 200, "playlist": {"name": "Chill", "tracks": [{"id": 1, "name": "a"}]}}"#,
        )
        .unwrap();
        assert_eq!(detail.playlist.name, "Chill");
        assert_eq!(detail.playlist.tracks.len(), 1);
    }

    #[test]
    fn test_album_detail_top_level_songs() {
        let detail: AlbumDetail = serde_json::from_str(
            r#"{"code": 200, "album": {"name": "LP"}, "songs": [{"id": 1, "name": "a"}, {"id": 2, "name": "b"}]}"#,
        )
        .unwrap();
        assert_eq!(detail.album.name, "LP");
        assert_eq!(detail.songs.len(), 2);
    }
}
