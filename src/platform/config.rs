// EximCrunch - platform/config.rs
//
// Platform config directory resolution and config.toml loading with startup
// validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::core::classify::ClassifyMode;
use crate::util::constants;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Resolved platform paths for EximCrunch configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/eximcrunch/ or %APPDATA%\EximCrunch\)
    pub config_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to current directory if platform dirs cannot be determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            tracing::debug!(config = %config_dir.display(), "Platform paths resolved");
            Self { config_dir }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            Self {
                config_dir: PathBuf::from("."),
            }
        }
    }

    /// Default location of config.toml.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(constants::CONFIG_FILE_NAME)
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored for forward compatibility -- a newer
/// config file can be used with an older binary without crashing.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// `[crunch]` section.
    pub crunch: CrunchSection,
    /// `[performance]` section.
    pub performance: PerformanceSection,
    /// `[logging]` section.
    pub logging: LoggingSection,
}

/// `[crunch]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct CrunchSection {
    /// Inclusion regex.
    pub email: Option<String>,
    /// Exclusion regex.
    pub ignore: Option<String>,
    /// "sender-anchored" or "symmetric".
    pub mode: Option<String>,
    /// Input file glob.
    pub files: Option<String>,
    /// Output file path.
    pub out: Option<String>,
}

/// `[performance]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct PerformanceSection {
    /// Concurrent file workers (0 = auto).
    pub threads: Option<usize>,
    /// Lines between progress snapshots.
    pub progress_interval: Option<u64>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
    /// JSON log lines instead of the pretty console format.
    pub plain: Option<bool>,
}

/// Validated settings from config.toml.
///
/// Every field is optional: `None` means "not set in the file", so the CLI
/// layer can apply its own precedence (flag > file > built-in default).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppConfig {
    // -- Crunch --
    pub email: Option<String>,
    pub ignore: Option<String>,
    pub mode: Option<ClassifyMode>,
    pub files: Option<String>,
    pub out: Option<PathBuf>,

    // -- Performance --
    pub threads: Option<usize>,
    pub progress_interval: Option<u64>,

    // -- Logging --
    pub log_level: Option<String>,
    pub plain_logs: Option<bool>,
}

/// Load and validate config.toml at `config_path`.
///
/// Returns `AppConfig` with validated values and a list of non-fatal warnings.
/// If the file does not exist, returns defaults with no warnings (first-run).
/// If the file is unreadable or unparseable, returns defaults with a warning
/// (the run still starts, but the user is informed).
pub fn load_config(config_path: &Path) -> (AppConfig, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();

    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "No config.toml found; using defaults");
        return (AppConfig::default(), warnings);
    }

    let content = match std::fs::read_to_string(config_path) {
        Ok(c) => c,
        Err(e) => {
            warnings.push(format!(
                "Could not read config file '{}': {e}. Using defaults.",
                config_path.display()
            ));
            return (AppConfig::default(), warnings);
        }
    };

    let raw: RawConfig = match toml::from_str(&content) {
        Ok(r) => r,
        Err(e) => {
            warnings.push(format!(
                "Failed to parse config file '{}': {e}. Using defaults.",
                config_path.display()
            ));
            return (AppConfig::default(), warnings);
        }
    };

    tracing::debug!(path = %config_path.display(), "Loaded config.toml");

    let config = validate(raw, &mut warnings);
    (config, warnings)
}

/// Validate each field against named constants, accumulating all warnings.
fn validate(raw: RawConfig, warnings: &mut Vec<String>) -> AppConfig {
    let mut config = AppConfig::default();

    // -- Crunch: patterns and paths --
    // Regex syntax is checked later by the classifier, where a bad pattern is
    // fatal; here only obviously empty values are rejected.
    config.email = non_empty(raw.crunch.email, "[crunch] email", warnings);
    config.ignore = raw.crunch.ignore;
    config.files = non_empty(raw.crunch.files, "[crunch] files", warnings);
    config.out = non_empty(raw.crunch.out, "[crunch] out", warnings).map(PathBuf::from);

    // -- Crunch: mode --
    if let Some(ref mode) = raw.crunch.mode {
        match mode.parse::<ClassifyMode>() {
            Ok(m) => config.mode = Some(m),
            Err(e) => warnings.push(format!(
                "[crunch] mode: {e}. Using default ({}).",
                ClassifyMode::default()
            )),
        }
    }

    // -- Performance: threads --
    if let Some(threads) = raw.performance.threads {
        if threads <= constants::ABSOLUTE_MAX_CONCURRENCY {
            config.threads = Some(threads);
        } else {
            warnings.push(format!(
                "[performance] threads = {threads} is out of range (0-{}). Using default (auto).",
                constants::ABSOLUTE_MAX_CONCURRENCY,
            ));
        }
    }

    // -- Performance: progress_interval --
    if let Some(interval) = raw.performance.progress_interval {
        if (constants::MIN_PROGRESS_INTERVAL..=constants::MAX_PROGRESS_INTERVAL).contains(&interval) {
            config.progress_interval = Some(interval);
        } else {
            warnings.push(format!(
                "[performance] progress_interval = {interval} is out of range ({}-{}). Using default ({}).",
                constants::MIN_PROGRESS_INTERVAL,
                constants::MAX_PROGRESS_INTERVAL,
                constants::DEFAULT_PROGRESS_INTERVAL,
            ));
        }
    }

    // -- Logging: level --
    if let Some(ref level) = raw.logging.level {
        if constants::VALID_LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.to_lowercase());
        } else {
            warnings.push(format!(
                "[logging] level = \"{level}\" is not recognised. \
                 Valid values: {}. Using default ({}).",
                constants::VALID_LOG_LEVELS.join(", "),
                constants::DEFAULT_LOG_LEVEL,
            ));
        }
    }

    config.plain_logs = raw.logging.plain;
    config
}

fn non_empty(value: Option<String>, field: &str, warnings: &mut Vec<String>) -> Option<String> {
    match value {
        Some(v) if v.trim().is_empty() => {
            warnings.push(format!("{field} is empty and will be ignored."));
            None
        }
        other => other,
    }
}
