//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, parser::ValueSource};
use yun_core::Quality;
use yun_core::download::DEFAULT_MAX_ATTEMPTS;

/// Default concurrency shown in `--help`.
pub const DEFAULT_CLI_CONCURRENCY: u8 = 5;

/// Default per-attempt timeout in minutes.
pub const DEFAULT_RETRY_TIMEOUT_MINUTES: u64 = 3;

/// Download every track of a music.163.com playlist or album.
///
/// Tracks are written under the output directory following a filename
/// template; tracks whose file already exists at full size are skipped.
#[derive(Parser, Debug, Clone)]
#[command(name = "yun")]
#[command(author, version, about)]
pub struct Args {
    /// Playlist or album page URL
    #[arg(value_name = "URL")]
    pub url: String,

    /// Maximum concurrent downloads (1-100)
    #[arg(short = 'c', long, default_value_t = DEFAULT_CLI_CONCURRENCY, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub concurrency: u8,

    /// Filename template (tokens: :type :typeText :name :songName :singer :index :rawIndex :ext)
    #[arg(short = 'f', long, default_value = yun_core::DEFAULT_TEMPLATE)]
    pub format: String,

    /// Playback quality in kbps (128, 192 or 320)
    #[arg(long, default_value = "320")]
    pub quality: Quality,

    /// Time budget per download attempt, in minutes
    #[arg(long, default_value_t = DEFAULT_RETRY_TIMEOUT_MINUTES, value_parser = clap::value_parser!(u64).range(1..=1440))]
    pub retry_timeout: u64,

    /// Attempts per track, including the first (1-10)
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS as u8, value_parser = clap::value_parser!(u8).range(1..=10))]
    pub retry_times: u8,

    /// Skip tracks whose file is already complete (default)
    #[arg(long, overrides_with = "no_skip")]
    pub skip: bool,

    /// Always download, even when the file already exists
    #[arg(long = "no-skip", overrides_with = "skip")]
    pub no_skip: bool,

    /// Directory downloads are written under
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Show a progress bar
    #[arg(long)]
    pub progress: bool,

    /// Print the planned file names without downloading
    #[arg(long)]
    pub dry_run: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Whether the skip check is on, from the command line alone.
    #[must_use]
    pub fn skip_existing(&self) -> bool {
        !self.no_skip
    }
}

/// Which options were given explicitly on the command line.
#[derive(Debug, Clone, Copy, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct CliValueSources {
    pub output_dir: bool,
    pub format: bool,
    pub quality: bool,
    pub concurrency: bool,
    pub retry_times: bool,
    pub retry_timeout: bool,
    pub skip: bool,
}

/// Parses the process arguments and records which were explicit.
pub fn parse_cli_with_sources() -> (Args, CliValueSources) {
    let matches = Args::command().get_matches();
    let args = Args::from_arg_matches(&matches).unwrap_or_else(|err| err.exit());
    (args, value_sources(&matches))
}

fn value_sources(matches: &ArgMatches) -> CliValueSources {
    CliValueSources {
        output_dir: is_commandline_value(matches, "output_dir"),
        format: is_commandline_value(matches, "format"),
        quality: is_commandline_value(matches, "quality"),
        concurrency: is_commandline_value(matches, "concurrency"),
        retry_times: is_commandline_value(matches, "retry_times"),
        retry_timeout: is_commandline_value(matches, "retry_timeout"),
        skip: is_commandline_value(matches, "skip") || is_commandline_value(matches, "no_skip"),
    }
}

fn is_commandline_value(matches: &ArgMatches, id: &str) -> bool {
    matches.value_source(id) == Some(ValueSource::CommandLine)
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://music.163.com/#/playlist?id=12583200";

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["yun", URL];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    fn sources(extra: &[&str]) -> CliValueSources {
        let mut argv = vec!["yun", URL];
        argv.extend_from_slice(extra);
        let matches = Args::command().try_get_matches_from(argv).unwrap();
        value_sources(&matches)
    }

    #[test]
    fn test_cli_default_args_parses_successfully() {
        let args = parse(&[]);
        assert_eq!(args.url, URL);
        assert_eq!(args.concurrency, 5);
        assert_eq!(args.format, ":name/:singer - :songName.:ext");
        assert_eq!(args.quality, Quality::Exhigh);
        assert_eq!(args.retry_timeout, 3);
        assert_eq!(args.retry_times, 3);
        assert!(args.skip_existing());
        assert!(args.output_dir.is_none());
        assert!(!args.progress);
        assert!(!args.dry_run);
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
    }

    #[test]
    fn test_cli_url_is_required() {
        let err = Args::try_parse_from(["yun"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        assert_eq!(parse(&["-v"]).verbose, 1);
        assert_eq!(parse(&["-vv"]).verbose, 2);
        assert_eq!(parse(&["--verbose", "--verbose"]).verbose, 2);
    }

    #[test]
    fn test_cli_quiet_flag_sets_quiet() {
        assert!(parse(&["-q"]).quiet);
        assert!(parse(&["--quiet"]).quiet);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Args::try_parse_from(["yun", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_version_flag_shows_version() {
        let err = Args::try_parse_from(["yun", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_cli_concurrency_bounds() {
        assert_eq!(parse(&["-c", "1"]).concurrency, 1);
        assert_eq!(parse(&["--concurrency", "100"]).concurrency, 100);
        for bad in ["0", "101"] {
            let err = Args::try_parse_from(["yun", URL, "-c", bad]).unwrap_err();
            assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        }
    }

    #[test]
    fn test_cli_retry_times_bounds() {
        assert_eq!(parse(&["--retry-times", "10"]).retry_times, 10);
        let err = Args::try_parse_from(["yun", URL, "--retry-times", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        let err = Args::try_parse_from(["yun", URL, "--retry-times", "11"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_quality_values() {
        assert_eq!(parse(&["--quality", "128"]).quality, Quality::Standard);
        assert_eq!(parse(&["--quality", "192"]).quality, Quality::Higher);
        let err = Args::try_parse_from(["yun", URL, "--quality", "256"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_skip_flags_last_one_wins() {
        assert!(!parse(&["--no-skip"]).skip_existing());
        assert!(parse(&["--no-skip", "--skip"]).skip_existing());
        assert!(!parse(&["--skip", "--no-skip"]).skip_existing());
    }

    #[test]
    fn test_cli_format_and_output_dir() {
        let args = parse(&["-f", ":index.:ext", "-o", "/music"]);
        assert_eq!(args.format, ":index.:ext");
        assert_eq!(args.output_dir, Some(PathBuf::from("/music")));
    }

    #[test]
    fn test_cli_value_sources_track_explicit_flags() {
        let defaults = sources(&[]);
        assert!(!defaults.concurrency && !defaults.format && !defaults.skip);

        let explicit = sources(&["-c", "5", "--no-skip", "--quality", "320"]);
        assert!(explicit.concurrency);
        assert!(explicit.skip);
        assert!(explicit.quality);
        assert!(!explicit.retry_times);
    }
}
