//! Single-track download with skip check, per-attempt timeout and retries.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::retry::{RetryDecision, RetryPolicy, classify_error};
use super::{
    DownloadError, DownloadEvent, DownloadJob, DownloadOutcome, HttpClient, ProgressReporter,
};

/// Default time budget for one attempt (3 minutes).
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(180);

/// Downloads one job at a time; share it across tasks behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: HttpClient,
    policy: RetryPolicy,
    attempt_timeout: Duration,
    skip_existing: bool,
}

impl Downloader {
    /// Creates a downloader with the default policy, timeout and skip check.
    #[must_use]
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            policy: RetryPolicy::default(),
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            skip_existing: true,
        }
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the time budget for each attempt.
    #[must_use]
    pub fn with_attempt_timeout(mut self, attempt_timeout: Duration) -> Self {
        self.attempt_timeout = attempt_timeout;
        self
    }

    /// Enables or disables the already-downloaded check.
    #[must_use]
    pub fn with_skip_existing(mut self, skip_existing: bool) -> Self {
        self.skip_existing = skip_existing;
        self
    }

    /// Returns the retry policy.
    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Downloads `job`, reporting each failed attempt and the terminal state.
    ///
    /// Never returns an error: failures are folded into
    /// [`DownloadOutcome::Failed`].
    #[instrument(skip_all, fields(label = %job.label, url = %job.url))]
    pub async fn download(
        &self,
        job: &DownloadJob,
        cancel: &CancellationToken,
        reporter: &dyn ProgressReporter,
    ) -> DownloadOutcome {
        if cancel.is_cancelled() {
            return cancelled(job, reporter);
        }

        if self.skip_existing {
            let complete = tokio::select! {
                biased;
                () = cancel.cancelled() => return cancelled(job, reporter),
                complete = self.already_complete(job) => complete,
            };
            if complete {
                info!(path = %job.destination.display(), "destination complete, skipping");
                reporter.report(job, &DownloadEvent::Skipped);
                return DownloadOutcome::Skipped;
            }
        }

        let mut attempt: u32 = 1;
        loop {
            if cancel.is_cancelled() {
                return cancelled(job, reporter);
            }

            debug!(attempt, "attempting download");
            let deadline = Instant::now() + self.attempt_timeout;
            let error = match self
                .client
                .fetch_to_file(&job.url, &job.destination, deadline, cancel)
                .await
            {
                Ok(bytes) => {
                    info!(bytes, path = %job.destination.display(), "download complete");
                    reporter.report(job, &DownloadEvent::Succeeded { bytes });
                    return DownloadOutcome::Succeeded { bytes };
                }
                Err(DownloadError::Cancelled { .. }) => return cancelled(job, reporter),
                Err(error) => error,
            };

            warn!(attempt, error = %error, "download attempt failed");
            reporter.report(
                job,
                &DownloadEvent::AttemptFailed {
                    attempt,
                    error: error.to_string(),
                },
            );

            match self.policy.should_retry(classify_error(&error), attempt) {
                RetryDecision::Retry {
                    delay,
                    attempt: next_attempt,
                } => {
                    if !delay.is_zero() {
                        tokio::select! {
                            biased;
                            () = cancel.cancelled() => return cancelled(job, reporter),
                            () = tokio::time::sleep(delay) => {}
                        }
                    }
                    attempt = next_attempt;
                }
                RetryDecision::DoNotRetry { reason } => {
                    warn!(attempts = attempt, %reason, "giving up on download");
                    reporter.report(
                        job,
                        &DownloadEvent::Failed {
                            attempts: attempt,
                            error: error.to_string(),
                        },
                    );
                    return DownloadOutcome::Failed {
                        error,
                        attempts: attempt,
                    };
                }
            }
        }
    }

    /// True when the destination exists and is at least the remote size.
    ///
    /// A failed probe or a missing size means "not complete".
    async fn already_complete(&self, job: &DownloadJob) -> bool {
        let Ok(metadata) = tokio::fs::metadata(&job.destination).await else {
            return false;
        };
        if !metadata.is_file() {
            return false;
        }
        match self.client.probe_content_length(&job.url).await {
            Ok(Some(remote)) => {
                debug!(local = metadata.len(), remote, "compared local and remote size");
                metadata.len() >= remote
            }
            Ok(None) => false,
            Err(error) => {
                debug!(error = %error, "size probe failed, downloading anyway");
                false
            }
        }
    }
}

fn cancelled(job: &DownloadJob, reporter: &dyn ProgressReporter) -> DownloadOutcome {
    debug!(label = %job.label, "download cancelled");
    reporter.report(job, &DownloadEvent::Cancelled);
    DownloadOutcome::Cancelled
}
