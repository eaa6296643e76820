// EximCrunch - app/crunch.rs
//
// Crunch lifecycle: validates the run configuration, performs every fatal
// startup check, fans the input files out to the bounded worker pool, then
// drains the aggregation into the output file.
//
// Ordering guarantees:
//   - Patterns are compiled, numeric settings validated, the output file
//     created and the worker pool built before any input file is opened.
//   - The aggregator is drained only after the pool has returned, i.e. once
//     no worker can still be recording.
//   - Per-file failures are counted in the summary and never abort the run.

use crate::core::aggregate::Aggregator;
use crate::core::classify::{ClassifyMode, Classifier};
use crate::core::export;
use crate::core::model::{CountersSnapshot, FileTask, RunCounters};
use crate::util::constants;
use crate::util::error::{ConfigError, ExportError, Result};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use super::pool::WorkerPool;
use super::worker::{FileWorker, ProgressTicker};

/// Fully resolved inputs for one crunch run.
#[derive(Debug, Clone)]
pub struct CrunchConfig {
    /// Regex selecting the addresses of interest.
    pub inclusion_pattern: String,
    /// Regex selecting correspondents to drop.
    pub exclusion_pattern: String,
    pub mode: ClassifyMode,
    /// Input files, already glob-expanded.
    pub files: Vec<PathBuf>,
    /// Lines (across all workers) between progress snapshots.
    pub progress_interval: u64,
    /// Maximum number of files processed at the same time.
    pub concurrency: usize,
    pub output_path: PathBuf,
}

impl CrunchConfig {
    /// Build a config with built-in defaults for everything but the
    /// inclusion pattern, input files and output path.
    pub fn new(
        inclusion_pattern: impl Into<String>,
        files: Vec<PathBuf>,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            inclusion_pattern: inclusion_pattern.into(),
            exclusion_pattern: constants::DEFAULT_IGNORE_PATTERN.to_string(),
            mode: ClassifyMode::default(),
            files,
            progress_interval: constants::DEFAULT_PROGRESS_INTERVAL,
            concurrency: constants::FALLBACK_CONCURRENCY,
            output_path: output_path.into(),
        }
    }
}

/// Statistics for a completed run.
#[derive(Debug, Clone, Default)]
pub struct CrunchSummary {
    pub counters: CountersSnapshot,
    pub files_total: usize,
    pub files_completed: usize,
    pub files_abandoned: usize,
    pub owners_written: usize,
    pub elapsed: Duration,
}

/// Execute one crunch run.
///
/// Returns `Err` only for fatal startup or output failures.
pub fn run(config: &CrunchConfig) -> Result<CrunchSummary> {
    let started = Instant::now();

    // -------------------------------------------------------------------------
    // Phase 1: Fatal startup checks (no input file is touched yet)
    // -------------------------------------------------------------------------
    let classifier = Classifier::new(
        &config.inclusion_pattern,
        &config.exclusion_pattern,
        config.mode,
    )?;

    if !(constants::MIN_PROGRESS_INTERVAL..=constants::MAX_PROGRESS_INTERVAL)
        .contains(&config.progress_interval)
    {
        return Err(ConfigError::ValueOutOfRange {
            field: "progress_interval".to_string(),
            value: config.progress_interval.to_string(),
            expected: format!(
                "{}-{}",
                constants::MIN_PROGRESS_INTERVAL,
                constants::MAX_PROGRESS_INTERVAL
            ),
        }
        .into());
    }

    let pool = WorkerPool::new(config.concurrency)?;

    let output = File::create(&config.output_path).map_err(|source| ExportError::Create {
        path: config.output_path.clone(),
        source,
    })?;

    // -------------------------------------------------------------------------
    // Phase 2: Crunching
    // -------------------------------------------------------------------------
    let tasks: Vec<FileTask> = config.files.iter().map(FileTask::new).collect();
    let aggregator = Aggregator::new();
    let counters = RunCounters::new();
    let progress = ProgressTicker::new(config.progress_interval);
    let worker = FileWorker::new(&classifier, &aggregator, &counters, &progress);
    let remaining = AtomicUsize::new(tasks.len());

    tracing::info!(
        files = tasks.len(),
        workers = pool.limit(),
        mode = %classifier.mode(),
        "Crunching started"
    );

    let outcomes = pool.run(&tasks, |task| {
        tracing::info!(
            file = %task.path.display(),
            remaining = remaining.load(Ordering::Relaxed),
            "Reading file"
        );
        let outcome = worker.process(task);
        remaining.fetch_sub(1, Ordering::Relaxed);
        outcome
    });

    let files_completed = outcomes.iter().filter(|o| o.is_completed()).count();
    let files_abandoned = outcomes.len() - files_completed;
    if files_abandoned > 0 {
        let abandoned: Vec<_> = outcomes
            .iter()
            .filter(|o| !o.is_completed())
            .map(|o| o.path().display().to_string())
            .collect();
        tracing::warn!(count = files_abandoned, files = ?abandoned, "Some files were abandoned");
    }

    // -------------------------------------------------------------------------
    // Phase 3: Output (single-threaded, workers quiesced)
    // -------------------------------------------------------------------------
    let counters = counters.snapshot();
    tracing::info!(count = counters.lines_matched, "Writing emails to file");

    let entries = aggregator.drain();
    let owners_written = export::write_results(&entries, BufWriter::new(output), &config.output_path)?;

    let summary = CrunchSummary {
        counters,
        files_total: tasks.len(),
        files_completed,
        files_abandoned,
        owners_written,
        elapsed: started.elapsed(),
    };

    tracing::info!(
        lines = summary.counters.lines_read,
        matched = summary.counters.lines_matched,
        ignored = summary.counters.lines_ignored,
        from = summary.counters.owners_created,
        files_completed,
        files_abandoned,
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "Finished crunching logfiles"
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::error::CrunchError;
    use std::fs;

    #[test]
    fn test_zero_progress_interval_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("emails");
        let config = CrunchConfig {
            progress_interval: 0,
            ..CrunchConfig::new(".*", Vec::new(), &out)
        };

        assert!(matches!(run(&config), Err(CrunchError::Config(_))));
        assert!(!out.exists(), "output must not be created on a fatal error");
    }

    #[test]
    fn test_unwritable_output_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("mainlog");
        fs::write(&log, "ts <= a@test.com x for b@other.com\n").unwrap();

        let config = CrunchConfig::new(
            r"test\.com$",
            vec![log],
            dir.path().join("no-such-dir").join("emails"),
        );
        assert!(matches!(
            run(&config),
            Err(CrunchError::Export(ExportError::Create { .. }))
        ));
    }

    #[test]
    fn test_no_files_writes_empty_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("emails");

        let summary = run(&CrunchConfig::new(".*", Vec::new(), &out)).unwrap();
        assert_eq!(summary.files_total, 0);
        assert_eq!(summary.owners_written, 0);
        assert_eq!(fs::read_to_string(&out).unwrap(), "");
    }
}
