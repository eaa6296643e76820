// EximCrunch - util/logging.rs
//
// Structured logging with runtime-selectable level and output format.
//
// Activation:
//   - Environment variable: RUST_LOG=debug (or trace)
//   - CLI flag: --debug (sets debug), or --level <LEVEL>
//   - Config file: [logging] level = "debug"
//
// Output: stderr. Pretty (compact, human-readable) by default; JSON lines
// when plain output is requested for log shippers.
// Never logs line contents at info level or above.

use tracing_subscriber::EnvFilter;

/// Initialise the logging subsystem.
///
/// `debug_flag` is true when the user passed --debug on the CLI.
/// `level` is the CLI --level value, falling back to config.toml's level.
/// `plain` selects JSON lines instead of the compact console format.
///
/// Priority: RUST_LOG env var > CLI --debug flag > level > default "info".
pub fn init(debug_flag: bool, level: Option<&str>, plain: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if debug_flag {
        EnvFilter::new("debug")
    } else if let Some(level) = level {
        EnvFilter::new(level)
    } else {
        EnvFilter::new(super::constants::DEFAULT_LOG_LEVEL)
    };

    // The two formats are distinct subscriber types, so each branch installs
    // its own.
    if plain {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(true)
            .compact()
            .init();
    }

    tracing::debug!(
        app = super::constants::APP_NAME,
        version = super::constants::APP_VERSION,
        plain,
        "Logging initialised"
    );
}
