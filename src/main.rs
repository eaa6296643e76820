// EximCrunch - main.rs
//
// Application entry point. Handles:
// 1. CLI argument parsing
// 2. config.toml loading (CLI flags take precedence)
// 3. Logging initialisation
// 4. Glob resolution of the input files
// 5. Running the crunch and mapping fatal errors to the exit code

use clap::Parser;
use eximcrunch::app::crunch::{self, CrunchConfig, CrunchSummary};
use eximcrunch::app::pool;
use eximcrunch::core::classify::ClassifyMode;
use eximcrunch::platform::config::{self, AppConfig, PlatformPaths};
use eximcrunch::platform::fs;
use eximcrunch::util::constants;
use eximcrunch::util::error::{ConfigError, Result};
use eximcrunch::util::logging;
use std::path::PathBuf;
use std::process::ExitCode;

/// EximCrunch - concurrent exim log cruncher.
///
/// Reads exim main logs (plain or gzip), extracts sender/recipient pairs from
/// delivery lines and writes, for every address of interest, the list of
/// addresses it has corresponded with.
#[derive(Parser, Debug)]
#[command(name = "eximcrunch", version, about)]
struct Cli {
    /// Regex selecting the addresses to group against.
    #[arg(short = 'e', long = "email")]
    email: Option<String>,

    /// Regex selecting correspondent addresses to ignore [default: ^$].
    #[arg(short = 'i', long = "ignore")]
    ignore: Option<String>,

    /// Classification mode: sender-anchored or symmetric [default: sender-anchored].
    #[arg(short = 'm', long = "mode")]
    mode: Option<ClassifyMode>,

    /// Glob pattern for the exim log files to read [default: *main.log*].
    #[arg(short = 'f', long = "files")]
    files: Option<String>,

    /// Number of lines read between progress messages [default: 1000000].
    #[arg(short = 'l', long = "log")]
    progress_interval: Option<u64>,

    /// Output file [default: emails].
    #[arg(short = 'o', long = "out")]
    out: Option<PathBuf>,

    /// Maximum number of files read concurrently (0 = one per CPU).
    #[arg(short = 't', long = "threads")]
    threads: Option<usize>,

    /// Log level.
    #[arg(long = "level", value_parser = ["error", "warn", "info", "debug", "trace"])]
    level: Option<String>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,

    /// Emit JSON log lines instead of the pretty console format.
    #[arg(long = "plain-logs")]
    plain_logs: bool,

    /// Path to config.toml (defaults to the platform config directory).
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load config.toml before logging so its [logging] section can apply.
    let explicit_config = cli.config.is_some();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PlatformPaths::resolve().config_file());
    let (file_config, config_warnings) = config::load_config(&config_path);

    let level = cli.level.as_deref().or(file_config.log_level.as_deref());
    let plain = cli.plain_logs || file_config.plain_logs.unwrap_or(false);
    logging::init(cli.debug, level, plain);

    if explicit_config && !config_path.exists() {
        tracing::warn!(path = %config_path.display(), "Config file not found; using defaults");
    }
    for warning in &config_warnings {
        tracing::warn!(warning = %warning, "Config warning");
    }

    match run(cli, file_config) {
        Ok(summary) if summary.files_abandoned > 0 => {
            tracing::warn!(
                abandoned = summary.files_abandoned,
                total = summary.files_total,
                "Output is incomplete: some files could not be read"
            );
            ExitCode::SUCCESS
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Crunch failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Merge CLI flags over config.toml over built-in defaults, resolve the
/// input glob and run the crunch.
fn run(cli: Cli, file: AppConfig) -> Result<CrunchSummary> {
    let email = cli
        .email
        .or(file.email)
        .ok_or(ConfigError::MissingField { field: "email" })?;
    let ignore = cli
        .ignore
        .or(file.ignore)
        .unwrap_or_else(|| constants::DEFAULT_IGNORE_PATTERN.to_string());
    let mode = cli.mode.or(file.mode).unwrap_or_default();
    let pattern = cli
        .files
        .or(file.files)
        .unwrap_or_else(|| constants::DEFAULT_FILE_GLOB.to_string());
    let progress_interval = cli
        .progress_interval
        .or(file.progress_interval)
        .unwrap_or(constants::DEFAULT_PROGRESS_INTERVAL);
    let threads = pool::resolve_concurrency(
        cli.threads
            .or(file.threads)
            .unwrap_or(constants::DEFAULT_CONCURRENCY),
    );
    let out = cli
        .out
        .or(file.out)
        .unwrap_or_else(|| PathBuf::from(constants::DEFAULT_OUTPUT_PATH));

    tracing::info!(
        version = constants::APP_VERSION,
        email = %email,
        ignore = %ignore,
        mode = %mode,
        files = %pattern,
        frequency = progress_interval,
        outfile = %out.display(),
        threads,
        "Starting exim4 logfile cruncher"
    );

    let (files, warnings) = fs::resolve_glob(&pattern)?;
    for warning in &warnings {
        tracing::warn!(warning = %warning, "Discovery warning");
    }
    if files.is_empty() {
        tracing::warn!(pattern = %pattern, "No log files matched; output will be empty");
    }

    crunch::run(&CrunchConfig {
        inclusion_pattern: email,
        exclusion_pattern: ignore,
        mode,
        files,
        progress_interval,
        concurrency: threads,
        output_path: out,
    })
}
