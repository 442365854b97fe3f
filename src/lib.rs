//! Core library for the `yun` playlist and album downloader.
//!
//! Given a music.163.com playlist or album URL, the library works out what
//! the collection contains, which tracks can actually be played, where each
//! track should be written, and then downloads them concurrently.
//!
//! # Architecture
//!
//! - [`collection`] - URL classification and per-kind listing adapters
//! - [`api`] - Metadata / playback-URL service boundary ([`MusicApi`])
//! - [`reconcile`] - Batched playback lookup joined back onto the listing
//! - [`template`] - `:token` filename templates
//! - [`download`] - Retryable single-track downloader and concurrent engine
//! - [`pipeline`] - The end-to-end run tying the stages together
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use tokio_util::sync::CancellationToken;
//! use yun_core::{Downloader, HttpClient, HttpSettings, NeteaseApi, Pipeline, PipelineOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpSettings::default().build_client()?;
//! let pipeline = Pipeline::new(
//!     client.clone(),
//!     Arc::new(NeteaseApi::new(client.clone())),
//!     Downloader::new(HttpClient::new(client)),
//!     PipelineOptions::default(),
//! );
//! let report = pipeline
//!     .run("https://music.163.com/#/playlist?id=12583200", &CancellationToken::new())
//!     .await?;
//! println!("{} tracks, ok = {}", report.jobs.len(), report.is_success());
//! # Ok(())
//! # }
//! ```

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod collection;
pub mod download;
pub mod error;
pub mod http_client;
pub mod page;
pub mod pipeline;
pub mod reconcile;
pub mod template;
pub mod track;
pub mod user_agent;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use api::{ApiError, MusicApi, NeteaseApi};
pub use collection::{
    AdapterRegistry, CollectionAdapter, CollectionError, CollectionKind,
    build_default_adapter_registry, normalize_url,
};
pub use download::{
    DownloadEngine, DownloadError, DownloadEvent, DownloadJob, DownloadOutcome, DownloadStats,
    Downloader, HttpClient, ProgressReporter, RetryPolicy,
};
pub use error::PipelineError;
pub use http_client::HttpSettings;
pub use pipeline::{Pipeline, PipelineOptions, RunPlan, RunReport};
pub use reconcile::{Reconciled, Reconciler};
pub use template::{DEFAULT_TEMPLATE, TemplateContext, render};
pub use track::{Quality, RawTrack, ResolvedTrack};
