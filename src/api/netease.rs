//! HTTP implementation of [`MusicApi`] against the NetEase Cloud Music web API.
//!
//! Every response is wrapped in a `{"code": ..}` envelope; anything other than
//! 200 is surfaced as [`ApiError::Service`] even when the HTTP status is 200.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::http_client::DEFAULT_REQUEST_TIMEOUT_SECS;
use crate::track::{PlaybackResult, Quality};

use super::{AlbumDetail, ApiError, MusicApi, PlaylistDetail};

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "http://music.163.com";

/// Upper bound on playlist tracks requested in one detail call.
const PLAYLIST_TRACK_LIMIT: &str = "100000";

#[derive(Debug, Deserialize)]
struct Envelope {
    code: i64,
    #[serde(default, alias = "message")]
    msg: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaybackResponse {
    #[serde(default)]
    data: Vec<PlaybackEntry>,
}

#[derive(Debug, Deserialize)]
struct PlaybackEntry {
    id: u64,
    #[serde(default)]
    url: Option<String>,
}

/// NetEase Cloud Music API client.
#[derive(Debug, Clone)]
pub struct NeteaseApi {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl NeteaseApi {
    /// Creates a client for the public API host.
    ///
    /// `client` should come from [`HttpSettings::build_client`](crate::HttpSettings::build_client)
    /// so requests carry the browser identity headers.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL)
    }

    /// Creates a client against a custom base URL (for testing with wiremock).
    #[must_use]
    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = format!("{}{endpoint}", self.base_url);
        debug!(api_url = %url, "calling music API");

        let response = self
            .client
            .get(&url)
            .query(query)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ApiError::network(endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::http_status(endpoint, status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::network(endpoint, e))?;
        decode_envelope(endpoint, &body)
    }
}

fn decode_envelope<T: DeserializeOwned>(endpoint: &str, body: &[u8]) -> Result<T, ApiError> {
    let envelope: Envelope =
        serde_json::from_slice(body).map_err(|e| ApiError::decode(endpoint, e))?;
    if envelope.code != 200 {
        return Err(ApiError::service(endpoint, envelope.code, envelope.msg));
    }
    serde_json::from_slice(body).map_err(|e| ApiError::decode(endpoint, e))
}

#[async_trait]
impl MusicApi for NeteaseApi {
    fn name(&self) -> &'static str {
        "netease"
    }

    #[instrument(skip(self), fields(api = "netease"))]
    async fn fetch_playlist(&self, id: u64) -> Result<PlaylistDetail, ApiError> {
        let detail: PlaylistDetail = self
            .get_json(
                "/api/v6/playlist/detail",
                &[
                    ("id", id.to_string()),
                    ("n", PLAYLIST_TRACK_LIMIT.to_string()),
                ],
            )
            .await?;
        debug!(
            tracks = detail.playlist.tracks.len(),
            name = %detail.playlist.name,
            "playlist fetched"
        );
        Ok(detail)
    }

    #[instrument(skip(self), fields(api = "netease"))]
    async fn fetch_album(&self, id: u64) -> Result<AlbumDetail, ApiError> {
        let endpoint = format!("/api/v1/album/{id}");
        let detail: AlbumDetail = self.get_json(&endpoint, &[]).await?;
        debug!(
            tracks = detail.songs.len(),
            name = %detail.album.name,
            "album fetched"
        );
        Ok(detail)
    }

    #[instrument(skip(self, ids), fields(api = "netease", count = ids.len(), quality = %quality))]
    async fn fetch_playback_urls(
        &self,
        ids: &[u64],
        quality: Quality,
    ) -> Result<Vec<PlaybackResult>, ApiError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let endpoint = "/api/song/enhance/player/url";
        let ids_param =
            serde_json::to_string(ids).map_err(|e| ApiError::decode(endpoint, e))?;
        let response: PlaybackResponse = self
            .get_json(
                endpoint,
                &[("ids", ids_param), ("br", quality.bitrate().to_string())],
            )
            .await?;
        debug!(returned = response.data.len(), "playback URLs fetched");
        Ok(response
            .data
            .into_iter()
            .map(|entry| PlaybackResult {
                id: entry.id,
                url: entry.url,
            })
            .collect())
    }
}
