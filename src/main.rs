//! CLI entry point for `yun`.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use yun_core::{
    Downloader, HttpClient, HttpSettings, NeteaseApi, Pipeline, PipelineOptions, RetryPolicy,
};

mod app_config;
mod cli;
mod config_runtime;
mod output;

use app_config::load_default_file_config;
use cli::parse_cli_with_sources;
use config_runtime::{RunSettings, resolve_default_log_level, resolve_settings};
use output::{ConsoleReporter, dry_run_lines, format_plan_header, summary_lines};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(error) => {
            eprintln!("Error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

/// Returns whether every job ended skipped or succeeded.
async fn run() -> Result<bool> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let (args, sources) = parse_cli_with_sources();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (warn)
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(resolve_default_log_level(&args)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let loaded = load_default_file_config()?;
    if let Some(path) = loaded.config.as_ref().and(loaded.path.as_ref()) {
        debug!(path = %path.display(), "loaded config file");
    }
    let settings = resolve_settings(&args, &sources, loaded.config.as_ref())?;
    debug!(?settings, "effective settings");

    let client = HttpSettings::default()
        .with_connect_timeout(settings.connect_timeout)
        .build_client()
        .context("Failed to build HTTP client")?;
    let pipeline = build_pipeline(&settings, client);

    if settings.dry_run {
        let plan = pipeline.plan(&settings.url).await?;
        for line in dry_run_lines(&plan) {
            println!("{line}");
        }
        return Ok(true);
    }

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    let plan = pipeline.plan(&settings.url).await?;
    println!("{}", format_plan_header(&plan));
    let reporter = Arc::new(if settings.progress {
        ConsoleReporter::with_progress(plan.jobs.len())
    } else {
        ConsoleReporter::plain()
    });
    let pipeline = pipeline.with_reporter(reporter.clone());

    let report = pipeline.execute(plan, &cancel).await;
    reporter.finish();
    let report = report?;

    info!(title = %report.title, kind = %report.kind, "collection processed");
    for line in summary_lines(&report) {
        println!("{line}");
    }
    if cancel.is_cancelled() {
        warn!("run interrupted");
        return Ok(false);
    }
    Ok(report.is_success())
}

fn build_pipeline(settings: &RunSettings, client: reqwest::Client) -> Pipeline {
    let downloader = Downloader::new(HttpClient::new(client.clone()))
        .with_retry_policy(RetryPolicy::with_max_attempts(settings.retry_times))
        .with_attempt_timeout(settings.attempt_timeout)
        .with_skip_existing(settings.skip_existing);
    let options = PipelineOptions {
        output_dir: settings.output_dir.clone(),
        template: settings.format.clone(),
        quality: settings.quality,
        concurrency: settings.concurrency,
        ..PipelineOptions::default()
    };
    Pipeline::new(
        client.clone(),
        Arc::new(NeteaseApi::new(client)),
        downloader,
        options,
    )
}

fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling downloads");
            cancel.cancel();
        }
    });
}
