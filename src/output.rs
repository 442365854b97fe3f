//! Console output: per-job status lines, dry-run listing and run summary.

use std::fmt::Write as _;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use yun_core::{
    DownloadEvent, DownloadJob, DownloadOutcome, ProgressReporter, RunPlan, RunReport,
};

/// Prints one line per failed attempt and per terminal state.
///
/// With a progress bar, lines are printed above the bar and each terminal
/// state advances it.
#[derive(Debug)]
pub struct ConsoleReporter {
    bar: Option<ProgressBar>,
}

impl ConsoleReporter {
    /// Plain `println!` output.
    #[must_use]
    pub fn plain() -> Self {
        Self { bar: None }
    }

    /// Output through a progress bar sized for `total` jobs.
    #[must_use]
    pub fn with_progress(total: usize) -> Self {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} [{elapsed_precise}]")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Self { bar: Some(bar) }
    }

    /// Removes the progress bar, if any.
    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }

    fn emit(&self, line: &str, terminal: bool) {
        match &self.bar {
            Some(bar) => {
                bar.println(line);
                if terminal {
                    bar.inc(1);
                }
            }
            None => println!("{line}"),
        }
    }
}

impl ProgressReporter for ConsoleReporter {
    fn report(&self, job: &DownloadJob, event: &DownloadEvent) {
        let terminal = !matches!(event, DownloadEvent::AttemptFailed { .. });
        self.emit(&format_event(job, event), terminal);
    }
}

/// Renders the status line for one event.
#[must_use]
pub fn format_event(job: &DownloadJob, event: &DownloadEvent) -> String {
    let path = job.destination.display();
    let label = &job.label;
    match event {
        DownloadEvent::AttemptFailed { attempt, error } => {
            format!("✘ {label} {attempt}次失败 {path}: {error}")
        }
        DownloadEvent::Skipped => format!("✔ {label} 下载跳过 {path}"),
        DownloadEvent::Succeeded { .. } => format!("✔ {label} 下载完成 {path}"),
        DownloadEvent::Failed { error, .. } => format!("✘ {label} 下载失败 {path}: {error}"),
        DownloadEvent::Cancelled => format!("- {label} 已取消 {path}"),
    }
}

/// Header printed before downloads start.
#[must_use]
pub fn format_plan_header(plan: &RunPlan) -> String {
    let mut header = format!(
        "{} {}: {} 首可下载",
        plan.kind.label(),
        plan.title,
        plan.jobs.len()
    );
    if !plan.dropped.is_empty() {
        let _ = write!(header, ", {} 首无法获取", plan.dropped.len());
    }
    header
}

/// Lines for `--dry-run`: the header, one destination per job, then the
/// dropped tracks.
#[must_use]
pub fn dry_run_lines(plan: &RunPlan) -> Vec<String> {
    let mut lines = vec![format_plan_header(plan)];
    lines.extend(
        plan.jobs
            .iter()
            .map(|job| format!("  {} {}", job.label, job.destination.display())),
    );
    lines.extend(
        plan.dropped
            .iter()
            .map(|track| format!("  - {} ({})", track.name, track.singer())),
    );
    lines
}

/// Summary lines printed after the run.
#[must_use]
pub fn summary_lines(report: &RunReport) -> Vec<String> {
    let stats = report.summary();
    let mut lines = vec![format!(
        "完成 {}/{}: {} 下载, {} 跳过, {} 失败, {} 取消, {} 未开始, 用时 {}",
        stats.succeeded + stats.skipped,
        stats.total(),
        stats.succeeded,
        stats.skipped,
        stats.failed,
        stats.cancelled,
        stats.not_attempted,
        format_elapsed(report.elapsed)
    )];
    if !report.dropped.is_empty() {
        lines.push(format!("{} 首无法获取播放地址:", report.dropped.len()));
        lines.extend(
            report
                .dropped
                .iter()
                .map(|track| format!("  - {} ({})", track.name, track.singer())),
        );
    }
    let failed: Vec<String> = report
        .unfinished()
        .filter(|(_, outcome)| matches!(outcome, DownloadOutcome::Failed { .. }))
        .map(|(job, _)| format!("  ✘ {}", job.destination.display()))
        .collect();
    if !failed.is_empty() {
        lines.push("下载失败:".to_string());
        lines.extend(failed);
    }
    lines
}

/// Formats a duration as `1m 05s` or `3.2s`.
#[must_use]
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs >= 60 {
        format!("{}m {:02}s", secs / 60, secs % 60)
    } else {
        format!("{:.1}s", elapsed.as_secs_f64())
    }
}
