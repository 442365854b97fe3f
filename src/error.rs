//! Run-level error for the download pipeline.

use thiserror::Error;

use crate::api::ApiError;
use crate::collection::CollectionError;
use crate::download::EngineError;
use crate::page::PageError;

/// Fatal failures that abort a run before or while planning downloads.
///
/// Failures of individual tracks are never reported here; they end up in the
/// run report as [`DownloadOutcome::Failed`](crate::download::DownloadOutcome).
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The URL is not a supported collection, or its listing failed.
    #[error(transparent)]
    Collection(#[from] CollectionError),

    /// The collection page could not be fetched.
    #[error("could not load collection page: {0}")]
    Markup(#[from] PageError),

    /// The playback-URL lookup failed.
    #[error("playback URL lookup failed: {0}")]
    Metadata(#[from] ApiError),

    /// The download engine could not be started.
    #[error(transparent)]
    Engine(#[from] EngineError),
}
