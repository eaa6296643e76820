// EximCrunch - platform/fs.rs
//
// Filesystem access: glob expansion of the input set and opening log files
// as buffered line sources, transparently decompressing gzip-rotated logs.

use crate::core::model::{Compression, FileTask};
use crate::util::constants;
use crate::util::error::DiscoveryError;
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

/// Expand `pattern` into the list of regular files it matches.
///
/// Returns the sorted file list plus non-fatal warnings for entries that
/// could not be read while expanding. A syntactically invalid pattern is the
/// only fatal error.
pub fn resolve_glob(pattern: &str) -> Result<(Vec<PathBuf>, Vec<String>), DiscoveryError> {
    let paths = glob::glob(pattern).map_err(|e| DiscoveryError::InvalidGlob {
        pattern: pattern.to_string(),
        source: e,
    })?;

    let mut files = Vec::new();
    let mut warnings = Vec::new();

    for entry in paths {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(path) => {
                tracing::trace!(path = %path.display(), "Skipping non-file glob match");
            }
            Err(e) => {
                let msg = format!("Cannot access '{}': {}", e.path().display(), e.error());
                tracing::debug!(warning = %msg, "Discovery warning");
                warnings.push(msg);
            }
        }
    }

    files.sort();
    tracing::debug!(
        pattern,
        files = files.len(),
        warnings = warnings.len(),
        "Glob resolved"
    );
    Ok((files, warnings))
}

/// Open a task's file as a buffered line source.
///
/// Gzip files are wrapped in a multi-member decoder (logrotate may append
/// members). Gzip header problems are not detected here: they surface on the
/// first read, where the worker treats them like any other read failure.
pub fn open_task(task: &FileTask) -> io::Result<Box<dyn BufRead + Send>> {
    let file = File::open(&task.path)?;
    Ok(match task.compression {
        Compression::Plain => Box::new(BufReader::with_capacity(constants::READ_BUFFER_SIZE, file)),
        Compression::Gzip => Box::new(BufReader::with_capacity(
            constants::READ_BUFFER_SIZE,
            MultiGzDecoder::new(file),
        )),
    })
}
