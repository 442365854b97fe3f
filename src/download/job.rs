//! Download jobs and their terminal outcomes.

use std::fmt;
use std::path::PathBuf;

use super::DownloadError;

/// One file to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadJob {
    /// Playable URL.
    pub url: String,
    /// Destination file, parents included.
    pub destination: PathBuf,
    /// Progress label such as `03/12`.
    pub label: String,
}

impl DownloadJob {
    /// Creates a job labelled `index/total`.
    #[must_use]
    pub fn new(
        url: impl Into<String>,
        destination: impl Into<PathBuf>,
        index: &str,
        total: usize,
    ) -> Self {
        let width = index.len();
        Self {
            url: url.into(),
            destination: destination.into(),
            label: format!("{index}/{total:0width$}"),
        }
    }
}

/// Terminal state of one job.
#[derive(Debug)]
pub enum DownloadOutcome {
    /// The destination already held at least the remote size.
    Skipped,
    /// The file was written in full.
    Succeeded {
        /// Bytes written.
        bytes: u64,
    },
    /// Every allowed attempt failed.
    Failed {
        /// Error from the final attempt.
        error: DownloadError,
        /// Attempts made, including the first.
        attempts: u32,
    },
    /// The run was cancelled while this job was in flight.
    Cancelled,
    /// The run was cancelled before this job started.
    NotAttempted,
}

impl DownloadOutcome {
    /// True for `Skipped` and `Succeeded`.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Skipped | Self::Succeeded { .. })
    }

    /// Short machine-readable state name.
    #[must_use]
    pub fn state(&self) -> &'static str {
        match self {
            Self::Skipped => "skipped",
            Self::Succeeded { .. } => "succeeded",
            Self::Failed { .. } => "failed",
            Self::Cancelled => "cancelled",
            Self::NotAttempted => "not-attempted",
        }
    }
}

impl fmt::Display for DownloadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded { bytes } => write!(f, "succeeded ({bytes} bytes)"),
            Self::Failed { error, attempts } => {
                write!(f, "failed after {attempts} attempt(s): {error}")
            }
            other => f.write_str(other.state()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_label_pads_total_to_index_width() {
        let job = DownloadJob::new("http://m/a.mp3", "/tmp/a.mp3", "03", 12);
        assert_eq!(job.label, "03/12");
        let job = DownloadJob::new("http://m/a.mp3", "/tmp/a.mp3", "007", 120);
        assert_eq!(job.label, "007/120");
    }

    #[test]
    fn test_outcome_is_ok() {
        assert!(DownloadOutcome::Skipped.is_ok());
        assert!(DownloadOutcome::Succeeded { bytes: 1 }.is_ok());
        assert!(!DownloadOutcome::Cancelled.is_ok());
        assert!(!DownloadOutcome::NotAttempted.is_ok());
        let failed = DownloadOutcome::Failed {
            error: DownloadError::http_status("http://m/a.mp3", 404),
            attempts: 1,
        };
        assert!(!failed.is_ok());
        assert_eq!(failed.state(), "failed");
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(
            DownloadOutcome::Succeeded { bytes: 42 }.to_string(),
            "succeeded (42 bytes)"
        );
        let failed = DownloadOutcome::Failed {
            error: DownloadError::timeout("http://m/a.mp3"),
            attempts: 3,
        };
        assert!(failed.to_string().starts_with("failed after 3 attempt(s)"));
        assert_eq!(DownloadOutcome::NotAttempted.to_string(), "not-attempted");
    }
}
