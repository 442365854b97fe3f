//! Merges built-in defaults, the config file and the command line.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, bail};
use yun_core::Quality;
use yun_core::download::MAX_ATTEMPTS_LIMIT;
use yun_core::http_client::DEFAULT_CONNECT_TIMEOUT_SECS;

use crate::app_config::FileConfig;
use crate::cli::{Args, CliValueSources};

/// Effective settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub url: String,
    pub output_dir: PathBuf,
    pub format: String,
    pub quality: Quality,
    pub concurrency: usize,
    pub retry_times: u32,
    pub attempt_timeout: Duration,
    pub skip_existing: bool,
    pub connect_timeout: Duration,
    pub progress: bool,
    pub dry_run: bool,
}

/// Resolves settings: explicit flags beat the config file, which beats the
/// flag defaults.
pub fn resolve_settings(
    args: &Args,
    sources: &CliValueSources,
    file_config: Option<&FileConfig>,
) -> Result<RunSettings> {
    let mut settings = RunSettings {
        url: args.url.clone(),
        output_dir: args
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(".")),
        format: args.format.clone(),
        quality: args.quality,
        concurrency: usize::from(args.concurrency),
        retry_times: u32::from(args.retry_times),
        attempt_timeout: Duration::from_secs(args.retry_timeout.saturating_mul(60)),
        skip_existing: args.skip_existing(),
        connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        progress: args.progress,
        dry_run: args.dry_run,
    };

    if let Some(file_config) = file_config {
        if !sources.output_dir
            && let Some(output_dir) = &file_config.output_dir
        {
            settings.output_dir.clone_from(output_dir);
        }
        if !sources.format
            && let Some(format) = &file_config.format
        {
            settings.format.clone_from(format);
        }
        if !sources.quality
            && let Some(quality) = file_config.quality
        {
            settings.quality = quality;
        }
        if !sources.concurrency
            && let Some(concurrency) = file_config.concurrency
        {
            settings.concurrency = usize::from(concurrency);
        }
        if !sources.retry_times
            && let Some(retry_times) = file_config.retry_times
        {
            settings.retry_times = u32::from(retry_times);
        }
        if !sources.retry_timeout
            && let Some(secs) = file_config.retry_timeout_secs
        {
            settings.attempt_timeout = Duration::from_secs(secs);
        }
        if !sources.skip
            && let Some(skip_existing) = file_config.skip_existing
        {
            settings.skip_existing = skip_existing;
        }
        if let Some(secs) = file_config.connect_timeout_secs {
            settings.connect_timeout = Duration::from_secs(secs);
        }
    }

    if !(1..=100).contains(&settings.concurrency) {
        bail!(
            "Invalid effective concurrency value: {}. Expected range: 1..=100",
            settings.concurrency
        );
    }
    if !(1..=MAX_ATTEMPTS_LIMIT).contains(&settings.retry_times) {
        bail!(
            "Invalid effective retry_times value: {}. Expected range: 1..={MAX_ATTEMPTS_LIMIT}",
            settings.retry_times
        );
    }

    Ok(settings)
}

/// Default log level from the verbosity flags.
///
/// Priority: `RUST_LOG` (applied by the caller) > `--quiet` > `-v` count.
pub fn resolve_default_log_level(args: &Args) -> &'static str {
    if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, FromArgMatches};

    use super::*;

    const URL: &str = "https://music.163.com/album?id=3";

    fn args_and_sources(extra: &[&str]) -> (Args, CliValueSources) {
        let mut argv = vec!["yun", URL];
        argv.extend_from_slice(extra);
        let matches = Args::command().try_get_matches_from(argv).unwrap();
        let args = Args::from_arg_matches(&matches).unwrap();
        let sources = CliValueSources {
            output_dir: extra.contains(&"-o"),
            format: extra.contains(&"-f"),
            quality: extra.contains(&"--quality"),
            concurrency: extra.contains(&"-c"),
            retry_times: extra.contains(&"--retry-times"),
            retry_timeout: extra.contains(&"--retry-timeout"),
            skip: extra.contains(&"--skip") || extra.contains(&"--no-skip"),
        };
        (args, sources)
    }

    #[test]
    fn test_resolve_settings_defaults_without_config() {
        let (args, sources) = args_and_sources(&[]);
        let settings = resolve_settings(&args, &sources, None).unwrap();
        assert_eq!(settings.url, URL);
        assert_eq!(settings.output_dir, PathBuf::from("."));
        assert_eq!(settings.concurrency, 5);
        assert_eq!(settings.retry_times, 3);
        assert_eq!(settings.attempt_timeout, Duration::from_secs(180));
        assert!(settings.skip_existing);
        assert_eq!(settings.connect_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_config_file_overrides_defaults() {
        let (args, sources) = args_and_sources(&[]);
        let config = FileConfig {
            output_dir: Some(PathBuf::from("/music")),
            format: Some(":index.:ext".to_string()),
            quality: Some(Quality::Standard),
            concurrency: Some(9),
            retry_times: Some(6),
            retry_timeout_secs: Some(45),
            skip_existing: Some(false),
            connect_timeout_secs: Some(7),
        };
        let settings = resolve_settings(&args, &sources, Some(&config)).unwrap();
        assert_eq!(settings.output_dir, PathBuf::from("/music"));
        assert_eq!(settings.format, ":index.:ext");
        assert_eq!(settings.quality, Quality::Standard);
        assert_eq!(settings.concurrency, 9);
        assert_eq!(settings.retry_times, 6);
        assert_eq!(settings.attempt_timeout, Duration::from_secs(45));
        assert!(!settings.skip_existing);
        assert_eq!(settings.connect_timeout, Duration::from_secs(7));
    }

    #[test]
    fn test_explicit_flags_beat_config_file() {
        let (args, sources) = args_and_sources(&["-c", "2", "--skip", "-o", "out"]);
        let config = FileConfig {
            output_dir: Some(PathBuf::from("/music")),
            concurrency: Some(9),
            skip_existing: Some(false),
            ..FileConfig::default()
        };
        let settings = resolve_settings(&args, &sources, Some(&config)).unwrap();
        assert_eq!(settings.concurrency, 2);
        assert!(settings.skip_existing);
        assert_eq!(settings.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn test_log_level_priority() {
        let (args, _) = args_and_sources(&[]);
        assert_eq!(resolve_default_log_level(&args), "warn");
        let (args, _) = args_and_sources(&["-v"]);
        assert_eq!(resolve_default_log_level(&args), "debug");
        let (args, _) = args_and_sources(&["-vv"]);
        assert_eq!(resolve_default_log_level(&args), "trace");
        let (args, _) = args_and_sources(&["-q", "-v"]);
        assert_eq!(resolve_default_log_level(&args), "error");
    }
}
