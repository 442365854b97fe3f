//! Progress events emitted by the downloader.

use std::sync::Mutex;

use super::DownloadJob;

/// Something that happened to a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadEvent {
    /// An attempt failed; more may follow.
    AttemptFailed {
        /// The attempt that failed (1-indexed).
        attempt: u32,
        /// Rendered error.
        error: String,
    },
    /// The destination was already complete.
    Skipped,
    /// The file was written.
    Succeeded {
        /// Bytes written.
        bytes: u64,
    },
    /// The job gave up.
    Failed {
        /// Attempts made.
        attempts: u32,
        /// Rendered error from the final attempt.
        error: String,
    },
    /// The job was aborted by cancellation.
    Cancelled,
}

/// Receives job events. Called from concurrent tasks.
pub trait ProgressReporter: Send + Sync {
    /// Handles one event for `job`.
    fn report(&self, job: &DownloadJob, event: &DownloadEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&self, _job: &DownloadJob, _event: &DownloadEvent) {}
}

/// Records events in arrival order.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<(String, DownloadEvent)>>,
}

impl RecordingReporter {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `(label, event)` pairs seen so far.
    #[must_use]
    pub fn events(&self) -> Vec<(String, DownloadEvent)> {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl ProgressReporter for RecordingReporter {
    fn report(&self, job: &DownloadJob, event: &DownloadEvent) {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push((job.label.clone(), event.clone()));
    }
}
