// EximCrunch - app/worker.rs
//
// Per-file worker: streams one (possibly gzip) log file line by line,
// parses and classifies each line, and records kept pairs in the shared
// aggregator.
//
// Error policy:
//   - Open, read and decompression failures abandon this file only. The
//     worker logs the failure and still returns an outcome, so the pool
//     always sees every task finish.
//   - Non-delivery lines and discarded pairs are counted as ignored and never
//     logged individually.
//   - Invalid UTF-8 is decoded lossily.

use crate::core::aggregate::Aggregator;
use crate::core::classify::{Classifier, Disposition};
use crate::core::model::{Compression, CountersSnapshot, FileOutcome, FileTask, RunCounters};
use crate::core::parser;
use crate::platform::fs;
use crate::util::constants;
use crate::util::error::IngestError;
use std::io::{self, BufRead};
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Instant;

// =============================================================================
// Progress ticker
// =============================================================================

/// Run-wide countdown that emits a counters snapshot roughly every
/// `interval` lines across all workers.
#[derive(Debug)]
pub struct ProgressTicker {
    interval: i64,
    countdown: AtomicI64,
}

impl ProgressTicker {
    pub fn new(interval: u64) -> Self {
        let interval = i64::try_from(interval.max(1)).unwrap_or(i64::MAX);
        Self {
            interval,
            countdown: AtomicI64::new(interval),
        }
    }

    /// Count one processed line. Returns the snapshot when this line
    /// completed an interval.
    ///
    /// Only the caller that takes the countdown from 1 to 0 reports and
    /// resets; decrements racing with the reset are dropped, which keeps
    /// the cadence approximate but never reports twice for one interval.
    pub fn tick(&self, counters: &RunCounters) -> Option<CountersSnapshot> {
        if self.countdown.fetch_sub(1, Ordering::Relaxed) != 1 {
            return None;
        }
        self.countdown.store(self.interval, Ordering::Relaxed);

        let snapshot = counters.snapshot();
        tracing::info!(
            lines = snapshot.lines_read,
            matched = snapshot.lines_matched,
            ignored = snapshot.lines_ignored,
            owners = snapshot.owners_created,
            "Crunching progress"
        );
        Some(snapshot)
    }
}

// =============================================================================
// FileWorker
// =============================================================================

/// Borrowed view of the run's shared state used to process files.
///
/// Cheap to copy; one instance is shared by every pool thread.
#[derive(Debug, Clone, Copy)]
pub struct FileWorker<'a> {
    classifier: &'a Classifier,
    aggregator: &'a Aggregator,
    counters: &'a RunCounters,
    progress: &'a ProgressTicker,
}

impl<'a> FileWorker<'a> {
    pub fn new(
        classifier: &'a Classifier,
        aggregator: &'a Aggregator,
        counters: &'a RunCounters,
        progress: &'a ProgressTicker,
    ) -> Self {
        Self {
            classifier,
            aggregator,
            counters,
            progress,
        }
    }

    /// Process one file to end of stream or first failure.
    pub fn process(&self, task: &FileTask) -> FileOutcome {
        let started = Instant::now();

        let reader = match fs::open_task(task) {
            Ok(r) => r,
            Err(source) => {
                let error = IngestError::Open {
                    file: task.path.clone(),
                    source,
                };
                tracing::error!(file = %task.path.display(), error = %error, "Could not open file");
                return FileOutcome::Abandoned {
                    path: task.path.clone(),
                    error,
                };
            }
        };

        match self.process_reader(reader, task) {
            Ok(lines) => {
                tracing::debug!(
                    file = %task.path.display(),
                    lines,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Finished reading file"
                );
                FileOutcome::Completed {
                    path: task.path.clone(),
                    lines,
                }
            }
            Err(error) => {
                tracing::error!(
                    file = %task.path.display(),
                    error = %error,
                    "Abandoning rest of file"
                );
                FileOutcome::Abandoned {
                    path: task.path.clone(),
                    error,
                }
            }
        }
    }

    /// Stream lines from an already-opened source. Returns the number of
    /// lines processed.
    ///
    /// Lines before a failure stay recorded; only the remainder is lost.
    pub fn process_reader<R: BufRead>(&self, mut reader: R, task: &FileTask) -> Result<u64, IngestError> {
        let mut buf: Vec<u8> = Vec::with_capacity(constants::LINE_BUFFER_CAPACITY);
        let mut line_number: u64 = 0;

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => return Ok(line_number),
                Ok(_) => {}
                Err(source) => return Err(read_failure(task, line_number + 1, source)),
            }
            line_number += 1;

            self.process_line(&String::from_utf8_lossy(&buf));
            self.progress.tick(self.counters);
        }
    }

    fn process_line(&self, line: &str) {
        self.counters.add_read();

        let Some(pair) = parser::parse_line(line) else {
            self.counters.add_ignored();
            return;
        };

        match self.classifier.classify(&pair) {
            Disposition::Keep {
                owner,
                correspondent,
            } => {
                if self.aggregator.record(owner, correspondent) {
                    self.counters.add_owner();
                }
                self.counters.add_matched();
            }
            Disposition::Discard(_) => self.counters.add_ignored(),
        }
    }
}

/// Map a read failure to the right error. The gzip decoder reports corrupt
/// or truncated streams as invalid input/data or unexpected EOF.
fn read_failure(task: &FileTask, line_number: u64, source: io::Error) -> IngestError {
    let corrupt = matches!(
        source.kind(),
        io::ErrorKind::InvalidInput | io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof
    );
    if task.compression == Compression::Gzip && corrupt {
        IngestError::Decompress {
            file: task.path.clone(),
            line_number,
            source,
        }
    } else {
        IngestError::Read {
            file: task.path.clone(),
            line_number,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::classify::ClassifyMode;
    use std::io::{BufReader, Cursor, Read};

    const SAMPLE: &str = "\
2024-01-01 10:00:00 1a-0001 <= alice@test.com H=x P=esmtp for bob@other.com
2024-01-01 10:00:01 1a-0001 => bob@other.com R=dnslookup T=remote_smtp
2024-01-01 10:00:02 1a-0001 Completed
2024-01-01 10:00:03 1b-0002 <= Alice@Test.com H=x P=esmtp for Carol@Other.com
2024-01-01 10:00:04 1c-0003 <= bob@other.com H=y P=esmtp for alice@test.com
2024-01-01 10:00:05 1d-0004 <= dave@test.com H=x P=esmtp for erin@other.com";

    struct Shared {
        classifier: Classifier,
        aggregator: Aggregator,
        counters: RunCounters,
        progress: ProgressTicker,
    }

    impl Shared {
        fn new() -> Self {
            Self {
                classifier: Classifier::new(r"(?i)test\.com$", "^$", ClassifyMode::SenderAnchored)
                    .unwrap(),
                aggregator: Aggregator::new(),
                counters: RunCounters::new(),
                progress: ProgressTicker::new(1_000),
            }
        }

        fn worker(&self) -> FileWorker<'_> {
            FileWorker::new(&self.classifier, &self.aggregator, &self.counters, &self.progress)
        }
    }

    #[test]
    fn test_process_reader_counts_and_aggregates() {
        let shared = Shared::new();
        let task = FileTask::new("mainlog");

        let lines = shared
            .worker()
            .process_reader(Cursor::new(SAMPLE), &task)
            .unwrap();

        // The final line has no trailing newline and must still count.
        assert_eq!(lines, 6);
        let snap = shared.counters.snapshot();
        assert_eq!(snap.lines_read, 6);
        assert_eq!(snap.lines_matched, 3);
        assert_eq!(snap.lines_ignored, 3);
        assert_eq!(snap.owners_created, 2);

        let entries = shared.aggregator.drain();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].owner, "alice@test.com");
        assert_eq!(entries[0].correspondents, ["bob@other.com", "carol@other.com"]);
        assert_eq!(entries[1].owner, "dave@test.com");
    }

    #[test]
    fn test_invalid_utf8_is_not_fatal() {
        let shared = Shared::new();
        let mut data = b"\xff\xfe garbage\n".to_vec();
        data.extend_from_slice(b"ts <= alice@test.com x for bob@other.com\n");

        let lines = shared
            .worker()
            .process_reader(Cursor::new(data), &FileTask::new("mainlog"))
            .unwrap();
        assert_eq!(lines, 2);
        assert_eq!(shared.counters.snapshot().lines_matched, 1);
    }

    /// Yields its data, then fails every subsequent read.
    struct FailingTail;

    impl Read for FailingTail {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("device went away"))
        }
    }

    #[test]
    fn test_mid_stream_failure_keeps_earlier_lines() {
        let shared = Shared::new();
        let head = Cursor::new(
            "ts <= alice@test.com x for bob@other.com\nts <= dave@test.com x for erin@other.com\n",
        );
        let reader = BufReader::new(head.chain(FailingTail));

        let err = shared
            .worker()
            .process_reader(reader, &FileTask::new("mainlog"))
            .unwrap_err();

        assert!(
            matches!(err, IngestError::Read { line_number: 3, .. }),
            "got {err:?}"
        );
        assert_eq!(shared.aggregator.owner_count(), 2);
    }

    #[test]
    fn test_missing_file_is_abandoned() {
        let shared = Shared::new();
        let dir = tempfile::tempdir().unwrap();
        let outcome = shared
            .worker()
            .process(&FileTask::new(dir.path().join("gone.log")));

        assert!(
            matches!(
                outcome,
                FileOutcome::Abandoned {
                    error: IngestError::Open { .. },
                    ..
                }
            ),
            "got {outcome:?}"
        );
    }

    #[test]
    fn test_corrupt_gzip_is_abandoned_as_decompress_failure() {
        let shared = Shared::new();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mainlog.1.gz");
        std::fs::write(&path, "this is definitely not a gzip stream\n").unwrap();

        let outcome = shared.worker().process(&FileTask::new(&path));
        assert!(
            matches!(
                outcome,
                FileOutcome::Abandoned {
                    error: IngestError::Decompress { .. },
                    ..
                }
            ),
            "got {outcome:?}"
        );
        assert_eq!(shared.counters.snapshot().lines_read, 0);
    }

    #[test]
    fn test_plain_file_completes() {
        let shared = Shared::new();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mainlog");
        std::fs::write(&path, SAMPLE).unwrap();

        let outcome = shared.worker().process(&FileTask::new(&path));
        assert!(
            matches!(outcome, FileOutcome::Completed { lines: 6, .. }),
            "got {outcome:?}"
        );
    }

    #[test]
    fn test_progress_ticker_reports_every_interval() {
        let counters = RunCounters::new();
        let ticker = ProgressTicker::new(3);

        let reported: Vec<usize> = (1..=7)
            .filter(|_| {
                counters.add_read();
                ticker.tick(&counters).is_some()
            })
            .collect();

        assert_eq!(reported, [3, 6]);
    }

    #[test]
    fn test_progress_ticker_interval_one_reports_every_line() {
        let counters = RunCounters::new();
        let ticker = ProgressTicker::new(1);
        assert!((0..5).all(|_| ticker.tick(&counters).is_some()));
    }
}
