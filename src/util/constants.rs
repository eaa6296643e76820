// EximCrunch - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.
// Every bound checked in config validation lives here.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "EximCrunch";

/// Application identifier used for config directories.
pub const APP_ID: &str = "EximCrunch";

/// Current application version (updated by release script).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Input selection
// =============================================================================

/// Default glob for exim main logs, including rotated and gzipped copies.
pub const DEFAULT_FILE_GLOB: &str = "*main.log*";

/// File extension (without the dot) that marks a gzip-compressed log.
pub const GZIP_EXTENSION: &str = "gz";

// =============================================================================
// Classification
// =============================================================================

/// Default exclusion pattern. Only an empty address can match it, and the
/// line parser never produces one.
pub const DEFAULT_IGNORE_PATTERN: &str = "^$";

/// Maximum regex pattern length to prevent ReDoS-sized patterns.
pub const MAX_REGEX_PATTERN_LENGTH: usize = 4_096;

// =============================================================================
// Crunching limits
// =============================================================================

/// Default number of lines (across all workers) between progress snapshots.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 1_000_000;

/// Smallest accepted progress interval.
pub const MIN_PROGRESS_INTERVAL: u64 = 1;

/// Largest accepted progress interval.
pub const MAX_PROGRESS_INTERVAL: u64 = 1_000_000_000;

/// Default number of concurrent file workers.
/// 0 means auto-detect (use available CPU cores).
pub const DEFAULT_CONCURRENCY: usize = 0;

/// Hard upper bound on concurrent file workers. Every worker is a dedicated
/// OS thread holding an open file handle.
pub const ABSOLUTE_MAX_CONCURRENCY: usize = 1_024;

/// Fallback worker count when the platform cannot report its parallelism.
pub const FALLBACK_CONCURRENCY: usize = 4;

/// Buffer size for streaming reads from (possibly decompressed) log files.
pub const READ_BUFFER_SIZE: usize = 64 * 1024; // 64 KB

/// Initial capacity of the per-worker line buffer. Grows on demand.
pub const LINE_BUFFER_CAPACITY: usize = 1024;

// =============================================================================
// Output
// =============================================================================

/// Default output file name, relative to the working directory.
pub const DEFAULT_OUTPUT_PATH: &str = "emails";

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Log levels accepted on the command line and in config.toml.
pub const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";
