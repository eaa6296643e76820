// EximCrunch - core/export.rs
//
// Flat-file export of the drained aggregation.
// Core layer: writes to any Write trait object.
//
// Format: one line per owner, `owner,correspondent1,correspondent2,...\n`.
// No header, no escaping (addresses never contain commas or whitespace
// because the line parser only extracts non-whitespace tokens, and commas in
// addresses are not supported).

use crate::core::aggregate::OwnerEntry;
use crate::util::error::ExportError;
use std::io::Write;
use std::path::Path;

/// Write every owner line and flush after each one, so a failure part-way
/// leaves all earlier lines intact on disk.
///
/// `export_path` is only used for error context. Returns the number of owner
/// lines written.
pub fn write_results<W: Write>(
    entries: &[OwnerEntry],
    mut writer: W,
    export_path: &Path,
) -> Result<usize, ExportError> {
    let io_err = |e: std::io::Error| ExportError::Io {
        path: export_path.to_path_buf(),
        source: e,
    };

    let mut count = 0;
    for entry in entries {
        writer.write_all(entry.owner.as_bytes()).map_err(io_err)?;
        for correspondent in &entry.correspondents {
            writer.write_all(b",").map_err(io_err)?;
            writer.write_all(correspondent.as_bytes()).map_err(io_err)?;
        }
        writer.write_all(b"\n").map_err(io_err)?;
        writer.flush().map_err(io_err)?;

        count += 1;
        tracing::debug!(owner = %entry.owner, correspondents = entry.correspondents.len(), "Finished owner");
    }

    Ok(count)
}
