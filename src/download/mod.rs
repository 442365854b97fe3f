//! Track transfers: retryable single downloads and the concurrent engine.
//!
//! # Features
//!
//! - Skip check comparing local size against a HEAD `Content-Length`
//! - Streaming writes with per-attempt deadline and partial-file cleanup
//! - Exponential backoff for transient failures ([`RetryPolicy`])
//! - Cooperative cancellation through a shared `CancellationToken`
//!
//! # Example
//!
//! ```no_run
//! use tokio_util::sync::CancellationToken;
//! use yun_core::download::{DownloadJob, Downloader, HttpClient, NoopReporter};
//!
//! # async fn example() {
//! let downloader = Downloader::new(HttpClient::new(reqwest::Client::new()));
//! let job = DownloadJob::new("http://m10.music.126.net/a.mp3", "out/a.mp3", "01", 12);
//! let outcome = downloader
//!     .download(&job, &CancellationToken::new(), &NoopReporter)
//!     .await;
//! println!("{}: {outcome}", job.label);
//! # }
//! ```

mod client;
mod downloader;
mod engine;
mod error;
mod job;
mod progress;
mod retry;

pub use client::HttpClient;
pub use downloader::{DEFAULT_ATTEMPT_TIMEOUT, Downloader};
pub use engine::{
    DEFAULT_CONCURRENCY, DownloadEngine, DownloadStats, EngineError, MAX_CONCURRENCY,
    MIN_CONCURRENCY,
};
pub use error::DownloadError;
pub use job::{DownloadJob, DownloadOutcome};
pub use progress::{DownloadEvent, NoopReporter, ProgressReporter, RecordingReporter};
pub use retry::{
    DEFAULT_MAX_ATTEMPTS, FailureType, MAX_ATTEMPTS_LIMIT, RetryDecision, RetryPolicy,
    classify_error,
};
