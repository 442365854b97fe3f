//! End-to-end run for one collection URL.
//!
//! The stages run strictly in order: normalize and classify the URL, fetch
//! the page for its title, list the tracks, reconcile playback URLs, render a
//! destination per track, then hand the jobs to the [`DownloadEngine`]. Any
//! failure before the engine starts aborts the run; failures of individual
//! tracks only show up in the [`RunReport`].

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::Client;
use scraper::Html;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::api::MusicApi;
use crate::collection::{
    AdapterRegistry, CollectionKind, build_default_adapter_registry, normalize_url,
};
use crate::download::{
    DEFAULT_CONCURRENCY, DownloadEngine, DownloadJob, DownloadOutcome, DownloadStats, Downloader,
    NoopReporter, ProgressReporter,
};
use crate::error::PipelineError;
use crate::http_client::DEFAULT_REQUEST_TIMEOUT_SECS;
use crate::page::fetch_markup;
use crate::reconcile::Reconciler;
use crate::template::{DEFAULT_TEMPLATE, TemplateContext, render};
use crate::track::{Quality, RawTrack};

/// Run-wide settings that shape the plan and the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Directory every rendered path is relative to.
    pub output_dir: PathBuf,
    /// Filename template.
    pub template: String,
    /// Requested bitrate.
    pub quality: Quality,
    /// Simultaneous transfers (1..=100).
    pub concurrency: usize,
    /// Timeout for the collection page request.
    pub page_timeout: Duration,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            template: DEFAULT_TEMPLATE.to_string(),
            quality: Quality::default(),
            concurrency: DEFAULT_CONCURRENCY,
            page_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

/// Everything decided before any byte is downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    /// Collection title.
    pub title: String,
    /// Collection kind.
    pub kind: CollectionKind,
    /// One job per playable track, in collection order.
    pub jobs: Vec<DownloadJob>,
    /// Tracks without a playable URL.
    pub dropped: Vec<RawTrack>,
}

/// Result of a completed run.
#[derive(Debug)]
pub struct RunReport {
    /// Collection title.
    pub title: String,
    /// Collection kind.
    pub kind: CollectionKind,
    /// Jobs in collection order.
    pub jobs: Vec<DownloadJob>,
    /// Outcome of `jobs[i]` at index `i`.
    pub outcomes: Vec<DownloadOutcome>,
    /// Tracks without a playable URL.
    pub dropped: Vec<RawTrack>,
    /// Wall time of the whole run.
    pub elapsed: Duration,
}

impl RunReport {
    /// Counts each outcome.
    #[must_use]
    pub fn summary(&self) -> DownloadStats {
        DownloadStats::from_outcomes(&self.outcomes)
    }

    /// True when every job was skipped or succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.summary().all_ok()
    }

    /// Jobs whose outcome is not ok, paired with that outcome.
    pub fn unfinished(&self) -> impl Iterator<Item = (&DownloadJob, &DownloadOutcome)> {
        self.jobs
            .iter()
            .zip(&self.outcomes)
            .filter(|(_, outcome)| !outcome.is_ok())
    }
}

/// Wires the stages together for one run.
pub struct Pipeline {
    client: Client,
    api: Arc<dyn MusicApi>,
    registry: AdapterRegistry,
    reconciler: Reconciler,
    downloader: Arc<Downloader>,
    reporter: Arc<dyn ProgressReporter>,
    options: PipelineOptions,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("api", &self.api.name())
            .field("registry", &self.registry)
            .field("downloader", &self.downloader)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Creates a pipeline with the default adapters and no progress output.
    ///
    /// `client` fetches collection pages and should carry the site headers.
    #[must_use]
    pub fn new(
        client: Client,
        api: Arc<dyn MusicApi>,
        downloader: Downloader,
        options: PipelineOptions,
    ) -> Self {
        Self {
            client,
            reconciler: Reconciler::new(Arc::clone(&api)),
            api,
            registry: build_default_adapter_registry(),
            downloader: Arc::new(downloader),
            reporter: Arc::new(NoopReporter),
            options,
        }
    }

    /// Replaces the adapter registry.
    #[must_use]
    pub fn with_registry(mut self, registry: AdapterRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Sets the progress reporter.
    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Returns the run options.
    #[must_use]
    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Resolves `url` into download jobs without transferring anything.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] when the URL is unsupported, the page or the
    /// listing cannot be fetched, or the playback lookup fails.
    #[instrument(skip(self))]
    pub async fn plan(&self, url: &str) -> Result<RunPlan, PipelineError> {
        let url = normalize_url(url);
        let adapter = self.registry.adapter_for(&url)?;
        let kind = adapter.kind();
        debug!(%kind, url = %url, "classified collection");

        let markup = fetch_markup(&self.client, &url, self.options.page_timeout).await?;
        let page_title = {
            let page = Html::parse_document(&markup);
            adapter.title(&page)
        };

        let listing = adapter.tracks(self.api.as_ref(), &url).await?;
        let title = if page_title.is_empty() {
            debug!(name = %listing.name, "page title missing, using listing name");
            listing.name
        } else {
            page_title
        };
        let total = listing.tracks.len();
        info!(%kind, title = %title, tracks = total, "collection listed");

        let reconciled = self
            .reconciler
            .reconcile(listing.tracks, self.options.quality)
            .await?;

        let mut taken = HashSet::new();
        let jobs = reconciled
            .tracks
            .iter()
            .map(|track| {
                let context = TemplateContext::new(kind, &title, track);
                let relative = render(&self.options.template, &context);
                let rendered = destination_for(&self.options.output_dir, &relative);
                let destination = unique_destination(rendered, &mut taken);
                DownloadJob::new(track.url.clone(), destination, &track.index, total)
            })
            .collect();

        Ok(RunPlan {
            title,
            kind,
            jobs,
            dropped: reconciled.dropped,
        })
    }

    /// Plans `url` and downloads every job.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] for the failures listed on [`Self::plan`] and
    /// for an invalid concurrency setting. Track failures are reported in the
    /// returned [`RunReport`].
    #[instrument(skip(self, cancel))]
    pub async fn run(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<RunReport, PipelineError> {
        // Reject a bad concurrency before any request goes out.
        DownloadEngine::new(self.options.concurrency)?;
        let plan = self.plan(url).await?;
        self.execute(plan, cancel).await
    }

    /// Downloads every job of an already computed plan.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Engine`] for an invalid concurrency setting.
    pub async fn execute(
        &self,
        plan: RunPlan,
        cancel: &CancellationToken,
    ) -> Result<RunReport, PipelineError> {
        let started = Instant::now();
        let engine = DownloadEngine::new(self.options.concurrency)?;

        let outcomes = engine
            .run(
                Arc::clone(&self.downloader),
                plan.jobs.clone(),
                cancel,
                Arc::clone(&self.reporter),
            )
            .await?;

        let report = RunReport {
            title: plan.title,
            kind: plan.kind,
            jobs: plan.jobs,
            outcomes,
            dropped: plan.dropped,
            elapsed: started.elapsed(),
        };
        info!(
            elapsed_ms = report.elapsed.as_millis(),
            ok = report.is_success(),
            "run finished"
        );
        Ok(report)
    }
}

/// Joins a rendered path onto the output directory, never escaping it via a
/// leading separator.
fn destination_for(output_dir: &Path, relative: &str) -> PathBuf {
    output_dir.join(relative.trim_start_matches(['/', '\\']))
}

/// Returns `candidate`, or `name (2).ext`, `name (3).ext`, ... when an earlier
/// job of the same plan already claimed it.
fn unique_destination(candidate: PathBuf, taken: &mut HashSet<PathBuf>) -> PathBuf {
    if taken.insert(candidate.clone()) {
        return candidate;
    }
    let stem = candidate
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = candidate
        .extension()
        .map(|ext| ext.to_string_lossy().into_owned());
    let mut suffix = 2;
    loop {
        let name = match &ext {
            Some(ext) => format!("{stem} ({suffix}).{ext}"),
            None => format!("{stem} ({suffix})"),
        };
        let next = candidate.with_file_name(name);
        if taken.insert(next.clone()) {
            debug!(path = %next.display(), "renamed colliding destination");
            return next;
        }
        suffix += 1;
    }
}
