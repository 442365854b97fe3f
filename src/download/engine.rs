//! Concurrent execution of download jobs.
//!
//! Jobs run as Tokio tasks gated by a semaphore. Permit acquisition races the
//! run's [`CancellationToken`]: once it fires, jobs that have not started are
//! reported as [`DownloadOutcome::NotAttempted`] and in-flight jobs abort.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use tokio_util::sync::CancellationToken;
//! use yun_core::download::{DownloadEngine, DownloadJob, Downloader, HttpClient, NoopReporter};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let downloader = Arc::new(Downloader::new(HttpClient::new(reqwest::Client::new())));
//! let engine = DownloadEngine::new(5)?;
//! let jobs = vec![DownloadJob::new("http://m10.music.126.net/a.mp3", "a.mp3", "1", 1)];
//! let outcomes = engine
//!     .run(downloader, jobs, &CancellationToken::new(), Arc::new(NoopReporter))
//!     .await?;
//! println!("{}", outcomes[0]);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::{DownloadJob, DownloadOutcome, Downloader, ProgressReporter};

/// Minimum allowed concurrency value.
pub const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency value.
pub const MAX_CONCURRENCY: usize = 100;

/// Default number of simultaneous transfers.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Error type for download engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Invalid concurrency value provided.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },

    /// Semaphore was closed unexpectedly.
    #[error("semaphore closed unexpectedly")]
    SemaphoreClosed,
}

/// Counts of each outcome in a batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DownloadStats {
    /// Jobs skipped because the destination was complete.
    pub skipped: usize,
    /// Jobs written successfully.
    pub succeeded: usize,
    /// Jobs that exhausted their attempts.
    pub failed: usize,
    /// Jobs aborted mid-flight.
    pub cancelled: usize,
    /// Jobs never started.
    pub not_attempted: usize,
}

impl DownloadStats {
    /// Tallies `outcomes`.
    #[must_use]
    pub fn from_outcomes(outcomes: &[DownloadOutcome]) -> Self {
        let mut stats = Self::default();
        for outcome in outcomes {
            match outcome {
                DownloadOutcome::Skipped => stats.skipped += 1,
                DownloadOutcome::Succeeded { .. } => stats.succeeded += 1,
                DownloadOutcome::Failed { .. } => stats.failed += 1,
                DownloadOutcome::Cancelled => stats.cancelled += 1,
                DownloadOutcome::NotAttempted => stats.not_attempted += 1,
            }
        }
        stats
    }

    /// Total jobs counted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.skipped + self.succeeded + self.failed + self.cancelled + self.not_attempted
    }

    /// True when every job was skipped or succeeded.
    #[must_use]
    pub fn all_ok(&self) -> bool {
        self.failed == 0 && self.cancelled == 0 && self.not_attempted == 0
    }
}

/// Runs jobs with bounded concurrency.
#[derive(Debug)]
pub struct DownloadEngine {
    semaphore: Arc<Semaphore>,
    concurrency: usize,
}

impl DownloadEngine {
    /// Creates an engine allowing `concurrency` simultaneous jobs.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConcurrency`] if the value is outside
    /// 1..=100.
    ///
    /// # Example
    ///
    /// ```
    /// use yun_core::download::DownloadEngine;
    ///
    /// assert!(DownloadEngine::new(5).is_ok());
    /// assert!(DownloadEngine::new(0).is_err());
    /// ```
    #[instrument(level = "debug")]
    pub fn new(concurrency: usize) -> Result<Self, EngineError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&concurrency) {
            return Err(EngineError::InvalidConcurrency { value: concurrency });
        }
        debug!(concurrency, "creating download engine");
        Ok(Self {
            semaphore: Arc::new(Semaphore::new(concurrency)),
            concurrency,
        })
    }

    /// Returns the configured concurrency limit.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Runs every job and returns their outcomes in job order.
    ///
    /// Individual failures are recorded, never propagated.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SemaphoreClosed`] if the semaphore is closed.
    ///
    /// # Panics
    ///
    /// Re-raises a panic from a download task.
    #[instrument(skip_all, fields(jobs = jobs.len(), concurrency = self.concurrency))]
    pub async fn run(
        &self,
        downloader: Arc<Downloader>,
        jobs: Vec<DownloadJob>,
        cancel: &CancellationToken,
        reporter: Arc<dyn ProgressReporter>,
    ) -> Result<Vec<DownloadOutcome>, EngineError> {
        let total = jobs.len();
        let mut handles = Vec::with_capacity(total);

        info!("starting downloads");

        for (index, job) in jobs.into_iter().enumerate() {
            let permit = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    debug!(index, "cancelled before start");
                    break;
                }
                permit = self.semaphore.clone().acquire_owned() => {
                    permit.map_err(|_| EngineError::SemaphoreClosed)?
                }
            };

            let downloader = Arc::clone(&downloader);
            let reporter = Arc::clone(&reporter);
            let cancel = cancel.clone();
            handles.push(tokio::spawn(async move {
                let _permit = permit;
                start_job(&downloader, &job, &cancel, reporter.as_ref()).await
            }));
        }

        debug!(
            task_count = handles.len(),
            "waiting for downloads to complete"
        );

        let mut outcomes = Vec::with_capacity(total);
        for handle in handles {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(e) => {
                    warn!(error = %e, "download task aborted");
                    outcomes.push(DownloadOutcome::Cancelled);
                }
            }
        }
        outcomes.resize_with(total, || DownloadOutcome::NotAttempted);

        let stats = DownloadStats::from_outcomes(&outcomes);
        info!(
            succeeded = stats.succeeded,
            skipped = stats.skipped,
            failed = stats.failed,
            cancelled = stats.cancelled,
            not_attempted = stats.not_attempted,
            "downloads finished"
        );
        Ok(outcomes)
    }
}

/// Runs one job unless the token fired between permit and task start.
async fn start_job(
    downloader: &Downloader,
    job: &DownloadJob,
    cancel: &CancellationToken,
    reporter: &dyn ProgressReporter,
) -> DownloadOutcome {
    if cancel.is_cancelled() {
        debug!(label = %job.label, "cancelled before task start");
        return DownloadOutcome::NotAttempted;
    }
    downloader.download(job, cancel, reporter).await
}
