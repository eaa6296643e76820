// EximCrunch - core/model.rs
//
// Core data model types. Pure data definitions with no I/O and no
// platform dependencies.
//
// These types are the shared vocabulary across all layers.

use crate::util::constants;
use crate::util::error::IngestError;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

// =============================================================================
// Correspondence pair (output of line parsing)
// =============================================================================

/// A sender/recipient pair extracted from one delivery line.
///
/// Borrows from the line it was parsed from; it lives only as long as the
/// classifier needs it and is never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrespondencePair<'a> {
    /// Token following the `<=` marker.
    pub from: &'a str,
    /// Token following the `for` marker.
    pub to: &'a str,
}

// =============================================================================
// File task (unit of work for one worker)
// =============================================================================

/// How a log file's bytes must be decoded before line splitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Plain,
    Gzip,
}

impl Compression {
    /// Derive the decompression mode from a path's extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case(constants::GZIP_EXTENSION) => Self::Gzip,
            _ => Self::Plain,
        }
    }
}

/// One resolved input file plus its decompression mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTask {
    pub path: PathBuf,
    pub compression: Compression,
}

impl FileTask {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let compression = Compression::from_path(&path);
        Self { path, compression }
    }
}

/// Terminal report from a file worker. Every task produces exactly one.
#[derive(Debug)]
pub enum FileOutcome {
    /// The file was read to end of stream.
    Completed { path: PathBuf, lines: u64 },

    /// The file was abandoned part-way (or before the first line).
    Abandoned { path: PathBuf, error: IngestError },
}

impl FileOutcome {
    pub fn path(&self) -> &Path {
        match self {
            Self::Completed { path, .. } | Self::Abandoned { path, .. } => path,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

// =============================================================================
// Run counters
// =============================================================================

/// Run-wide line counters shared by every worker.
///
/// All fields only ever increase. Each counter is individually atomic; a
/// snapshot taken while workers are running is approximate across fields.
#[derive(Debug, Default)]
pub struct RunCounters {
    lines_read: AtomicU64,
    lines_matched: AtomicU64,
    lines_ignored: AtomicU64,
    owners_created: AtomicU64,
}

impl RunCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_read(&self) {
        self.lines_read.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_matched(&self) {
        self.lines_matched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_ignored(&self) {
        self.lines_ignored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_owner(&self) {
        self.owners_created.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the current values out for reporting.
    pub fn snapshot(&self) -> CountersSnapshot {
        CountersSnapshot {
            lines_read: self.lines_read.load(Ordering::Relaxed),
            lines_matched: self.lines_matched.load(Ordering::Relaxed),
            lines_ignored: self.lines_ignored.load(Ordering::Relaxed),
            owners_created: self.owners_created.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`RunCounters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountersSnapshot {
    pub lines_read: u64,
    pub lines_matched: u64,
    pub lines_ignored: u64,
    pub owners_created: u64,
}
