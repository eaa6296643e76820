// EximCrunch - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// No string-based error propagation.
// All errors preserve the causal chain for diagnostic logging.
//
// Fatal errors (config, pattern, discovery, export, thread pool) convert into
// `CrunchError` and abort the run. `IngestError` is per-file: it is logged by
// the worker that hit it and never converted into `CrunchError`.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for everything that aborts a crunch run.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum CrunchError {
    /// Configuration is missing or out of range.
    Config(ConfigError),

    /// An inclusion or exclusion pattern is unusable.
    Pattern(PatternError),

    /// Input file discovery failed.
    Discovery(DiscoveryError),

    /// The result file could not be created or written.
    Export(ExportError),

    /// The bounded worker pool could not be started.
    ThreadPool {
        threads: usize,
        source: rayon::ThreadPoolBuildError,
    },
}

impl fmt::Display for CrunchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::Pattern(e) => write!(f, "Pattern error: {e}"),
            Self::Discovery(e) => write!(f, "Discovery error: {e}"),
            Self::Export(e) => write!(f, "Export error: {e}"),
            Self::ThreadPool { threads, source } => {
                write!(f, "Cannot start worker pool of {threads} threads: {source}")
            }
        }
    }
}

impl std::error::Error for CrunchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Pattern(e) => Some(e),
            Self::Discovery(e) => Some(e),
            Self::Export(e) => Some(e),
            Self::ThreadPool { source, .. } => Some(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading and validation.
#[derive(Debug)]
pub enum ConfigError {
    /// A required setting was given neither on the CLI nor in config.toml.
    MissingField { field: &'static str },

    /// A config value is out of the allowed range.
    ValueOutOfRange {
        field: String,
        value: String,
        expected: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField { field } => write!(
                f,
                "'{field}' is required. Pass --{field} or set it in the [crunch] section of config.toml."
            ),
            Self::ValueOutOfRange {
                field,
                value,
                expected,
            } => write!(
                f,
                "'{field}' = '{value}' is out of range. Expected: {expected}"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for CrunchError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Pattern errors
// ---------------------------------------------------------------------------

/// Errors related to the classification regexes.
#[derive(Debug)]
pub enum PatternError {
    /// The pattern does not compile.
    InvalidRegex {
        field: &'static str,
        pattern: String,
        source: regex::Error,
    },

    /// The pattern exceeds the maximum allowed length.
    RegexTooLong {
        field: &'static str,
        length: usize,
        max_length: usize,
    },
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRegex {
                field,
                pattern,
                source,
            } => write!(f, "invalid {field} regex '{pattern}': {source}"),
            Self::RegexTooLong {
                field,
                length,
                max_length,
            } => write!(
                f,
                "{field} regex is {length} chars, exceeds maximum of {max_length}"
            ),
        }
    }
}

impl std::error::Error for PatternError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidRegex { source, .. } => Some(source),
            Self::RegexTooLong { .. } => None,
        }
    }
}

impl From<PatternError> for CrunchError {
    fn from(e: PatternError) -> Self {
        Self::Pattern(e)
    }
}

// ---------------------------------------------------------------------------
// Discovery errors
// ---------------------------------------------------------------------------

/// Errors related to input file discovery.
#[derive(Debug)]
pub enum DiscoveryError {
    /// The file glob is syntactically invalid.
    InvalidGlob {
        pattern: String,
        source: glob::PatternError,
    },
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidGlob { pattern, source } => {
                write!(f, "Invalid file glob '{pattern}': {source}")
            }
        }
    }
}

impl std::error::Error for DiscoveryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidGlob { source, .. } => Some(source),
        }
    }
}

impl From<DiscoveryError> for CrunchError {
    fn from(e: DiscoveryError) -> Self {
        Self::Discovery(e)
    }
}

// ---------------------------------------------------------------------------
// Ingest errors (per-file, never fatal)
// ---------------------------------------------------------------------------

/// Errors that abandon a single input file.
#[derive(Debug)]
pub enum IngestError {
    /// The file could not be opened.
    Open { file: PathBuf, source: io::Error },

    /// Reading failed part-way through the file.
    Read {
        file: PathBuf,
        line_number: u64,
        source: io::Error,
    },

    /// The gzip stream is corrupt or truncated.
    Decompress {
        file: PathBuf,
        line_number: u64,
        source: io::Error,
    },
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open { file, source } => {
                write!(f, "'{}': cannot open: {source}", file.display())
            }
            Self::Read {
                file,
                line_number,
                source,
            } => write!(
                f,
                "'{}' line {line_number}: read failed: {source}",
                file.display()
            ),
            Self::Decompress {
                file,
                line_number,
                source,
            } => write!(
                f,
                "'{}' line {line_number}: gzip decompression failed: {source}",
                file.display()
            ),
        }
    }
}

impl std::error::Error for IngestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Open { source, .. } => Some(source),
            Self::Read { source, .. } => Some(source),
            Self::Decompress { source, .. } => Some(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Export errors
// ---------------------------------------------------------------------------

/// Errors related to writing the result file.
#[derive(Debug)]
pub enum ExportError {
    /// The output file could not be created.
    Create { path: PathBuf, source: io::Error },

    /// Writing or flushing an owner line failed.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create { path, source } => {
                write!(f, "Cannot create output '{}': {source}", path.display())
            }
            Self::Io { path, source } => {
                write!(f, "Output I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Create { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
        }
    }
}

impl From<ExportError> for CrunchError {
    fn from(e: ExportError) -> Self {
        Self::Export(e)
    }
}

/// Convenience type alias for EximCrunch results.
pub type Result<T> = std::result::Result<T, CrunchError>;
