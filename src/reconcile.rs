//! Joins collection tracks with the batched playback-URL lookup.
//!
//! One lookup is issued per collection regardless of its size. Tracks without
//! a usable URL are dropped (licensing gaps are expected, not errors) and the
//! survivors keep their collection order. Index padding is computed from the
//! original collection length so file names stay stable however many tracks
//! are dropped.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::api::{ApiError, MusicApi};
use crate::track::{PlaybackResult, Quality, RawTrack, ResolvedTrack};

/// Result of reconciling a collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciled {
    /// Tracks with a playable URL, in collection order.
    pub tracks: Vec<ResolvedTrack>,
    /// Tracks dropped for lack of a playable URL, in collection order.
    pub dropped: Vec<RawTrack>,
}

/// Resolves playable URLs for collection tracks.
#[derive(Clone)]
pub struct Reconciler {
    api: Arc<dyn MusicApi>,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("api", &self.api.name())
            .finish()
    }
}

impl Reconciler {
    /// Creates a reconciler backed by `api`.
    #[must_use]
    pub fn new(api: Arc<dyn MusicApi>) -> Self {
        Self { api }
    }

    /// Looks up playable URLs for `tracks` in one call and joins the results.
    ///
    /// An empty track list performs no lookup.
    ///
    /// # Errors
    ///
    /// Returns the lookup's [`ApiError`] unchanged.
    #[instrument(skip(self, tracks), fields(tracks = tracks.len(), quality = %quality))]
    pub async fn reconcile(
        &self,
        tracks: Vec<RawTrack>,
        quality: Quality,
    ) -> Result<Reconciled, ApiError> {
        if tracks.is_empty() {
            return Ok(Reconciled::default());
        }
        let ids: Vec<u64> = tracks.iter().map(|track| track.id).collect();
        let results = self.api.fetch_playback_urls(&ids, quality).await?;
        let reconciled = join_playback(tracks, &results);
        info!(
            playable = reconciled.tracks.len(),
            dropped = reconciled.dropped.len(),
            "tracks reconciled"
        );
        Ok(reconciled)
    }
}

/// Joins tracks with lookup results by id.
///
/// Results without a non-empty URL are ignored. When the service returns an
/// id twice, the first usable entry wins.
#[must_use]
pub fn join_playback(tracks: Vec<RawTrack>, results: &[PlaybackResult]) -> Reconciled {
    let mut urls: HashMap<u64, &str> = HashMap::with_capacity(results.len());
    for result in results {
        if let Some(url) = result.playable_url() {
            urls.entry(result.id).or_insert(url);
        }
    }

    let total = tracks.len();
    let mut reconciled = Reconciled::default();
    for track in tracks {
        match urls.get(&track.id) {
            Some(url) => {
                let url = (*url).to_string();
                reconciled.tracks.push(ResolvedTrack::new(track, url, total));
            }
            None => {
                debug!(id = track.id, name = %track.name, "no playable URL, dropping track");
                reconciled.dropped.push(track);
            }
        }
    }
    reconciled
}
