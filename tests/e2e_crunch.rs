// EximCrunch - tests/e2e_crunch.rs
//
// End-to-end tests for the crunch pipeline.
//
// These tests exercise the real filesystem, real gzip streams, the real
// rayon worker pool and real output files -- no mocks, no stubs. Each test
// builds its log files in a temporary directory, runs a full crunch and
// inspects the output file on disk.

use eximcrunch::app::crunch::{run, CrunchConfig};
use eximcrunch::core::classify::ClassifyMode;
use eximcrunch::util::error::{CrunchError, PatternError};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

// =============================================================================
// Helpers
// =============================================================================

const ROUND_TRIP_LINE: &str = "2024-01-01 10:00:00 <= alice@test.com ... for bob@other.com\n";

/// A realistic slice of an exim main log.
const MAINLOG: &str = "\
2024-01-15 14:30:22 1rPq2X-0004Zk-9a <= alice@test.com H=mail.test.com [192.0.2.10] P=esmtps S=2345 id=1@test.com for bob@other.com
2024-01-15 14:30:23 1rPq2X-0004Zk-9a => bob@other.com R=dnslookup T=remote_smtp H=mx.other.com [198.51.100.7]
2024-01-15 14:30:23 1rPq2X-0004Zk-9a Completed
2024-01-15 14:31:02 1rPq3A-0004Zz-1b <= ALICE@test.com H=mail.test.com [192.0.2.10] P=esmtps S=812 id=2@test.com for Carol@Remote.org
2024-01-15 14:31:40 1rPq3B-00050a-2c <= newsletter@lists.example H=lists.example [203.0.113.5] P=esmtp S=9000 for alice@test.com
2024-01-15 14:32:11 1rPq3C-00050b-3d <= dave@test.com H=mail.test.com [192.0.2.10] P=esmtps S=400 id=3@test.com for alice@test.com
2024-01-15 14:32:50 1rPq3D-00050c-4e <= dave@test.com H=mail.test.com [192.0.2.10] P=esmtps S=401 id=4@test.com for erin@other.com
";

fn write_gz(path: &Path, content: &str) {
    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(content.as_bytes()).unwrap();
    fs::write(path, enc.finish().unwrap()).unwrap();
}

fn config(files: Vec<PathBuf>, out: &Path) -> CrunchConfig {
    CrunchConfig {
        progress_interval: 2,
        concurrency: 2,
        ..CrunchConfig::new(r"test\.com$", files, out)
    }
}

fn output_lines(out: &Path) -> Vec<String> {
    fs::read_to_string(out)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn e2e_round_trip_single_line() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("mainlog");
    fs::write(&log, ROUND_TRIP_LINE).unwrap();
    let out = dir.path().join("emails");

    let summary = run(&config(vec![log], &out)).unwrap();

    assert_eq!(output_lines(&out), ["alice@test.com,bob@other.com"]);
    assert_eq!(summary.counters.lines_read, 1);
    assert_eq!(summary.counters.lines_matched, 1);
    assert_eq!(summary.counters.owners_created, 1);
    assert_eq!(summary.owners_written, 1);
}

#[test]
fn e2e_exclusion_discards_pair() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("mainlog");
    fs::write(&log, ROUND_TRIP_LINE).unwrap();
    let out = dir.path().join("emails");

    let cfg = CrunchConfig {
        exclusion_pattern: r"other\.com$".to_string(),
        ..config(vec![log], &out)
    };
    let summary = run(&cfg).unwrap();

    assert_eq!(summary.counters.lines_ignored, 1);
    assert_eq!(summary.counters.lines_matched, 0);
    assert_eq!(summary.owners_written, 0);
    assert_eq!(fs::read_to_string(&out).unwrap(), "");
}

#[test]
fn e2e_realistic_log_sender_anchored() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("mainlog");
    fs::write(&log, MAINLOG).unwrap();
    let out = dir.path().join("emails");

    // Case-insensitive inclusion so ALICE@test.com is folded into alice.
    let cfg = CrunchConfig {
        inclusion_pattern: r"(?i)test\.com$".to_string(),
        ..config(vec![log], &out)
    };
    let summary = run(&cfg).unwrap();

    assert_eq!(
        output_lines(&out),
        [
            "alice@test.com,bob@other.com,carol@remote.org",
            "dave@test.com,erin@other.com",
        ]
    );
    assert_eq!(summary.counters.lines_read, 7);
    assert_eq!(summary.counters.lines_matched, 3);
    // Two non-delivery lines, one inbound, one internal.
    assert_eq!(summary.counters.lines_ignored, 4);
    assert_eq!(summary.counters.owners_created, 2);
}

#[test]
fn e2e_realistic_log_symmetric() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("mainlog");
    fs::write(&log, MAINLOG).unwrap();
    let out = dir.path().join("emails");

    let cfg = CrunchConfig {
        inclusion_pattern: r"(?i)test\.com$".to_string(),
        mode: ClassifyMode::Symmetric,
        ..config(vec![log], &out)
    };
    run(&cfg).unwrap();

    // The inbound newsletter is now recorded against its recipient; the
    // internal dave -> alice message is still dropped.
    assert_eq!(
        output_lines(&out),
        [
            "alice@test.com,bob@other.com,carol@remote.org,newsletter@lists.example",
            "dave@test.com,erin@other.com",
        ]
    );
}

#[test]
fn e2e_gzip_and_plain_produce_identical_output() {
    let dir = tempfile::tempdir().unwrap();
    let plain = dir.path().join("mainlog");
    let gz = dir.path().join("mainlog.1.gz");
    fs::write(&plain, MAINLOG).unwrap();
    write_gz(&gz, MAINLOG);

    let out_plain = dir.path().join("emails.plain");
    let out_gz = dir.path().join("emails.gz.out");
    run(&config(vec![plain], &out_plain)).unwrap();
    run(&config(vec![gz], &out_gz)).unwrap();

    let plain_bytes = fs::read(&out_plain).unwrap();
    assert!(!plain_bytes.is_empty());
    assert_eq!(plain_bytes, fs::read(&out_gz).unwrap());
}

#[test]
fn e2e_concatenated_gzip_members_are_all_read() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("mainlog.1.gz");

    // Rotation can append a second gzip member to an existing archive.
    let mut data = Vec::new();
    for line in [
        "ts 1a <= alice@test.com x for bob@other.com\n",
        "ts 1b <= alice@test.com x for carol@other.com\n",
    ] {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(line.as_bytes()).unwrap();
        data.extend(enc.finish().unwrap());
    }
    fs::write(&log, data).unwrap();
    let out = dir.path().join("emails");

    let summary = run(&config(vec![log], &out)).unwrap();

    assert_eq!(
        output_lines(&out),
        ["alice@test.com,bob@other.com,carol@other.com"]
    );
    assert_eq!(summary.counters.lines_read, 2);
    assert_eq!(summary.files_completed, 1);
}

#[test]
fn e2e_multiple_files_merge_into_one_owner() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("mainlog");
    let second = dir.path().join("mainlog.1.gz");
    fs::write(
        &first,
        "ts 1a <= alice@test.com x for bob@other.com\nts 1b <= alice@test.com x for carol@other.com\n",
    )
    .unwrap();
    write_gz(
        &second,
        "ts 2a <= alice@test.com x for carol@other.com\nts 2b <= alice@test.com x for dan@other.com\n",
    );
    let out = dir.path().join("emails");

    let summary = run(&config(vec![first, second], &out)).unwrap();

    assert_eq!(
        output_lines(&out),
        ["alice@test.com,bob@other.com,carol@other.com,dan@other.com"]
    );
    assert_eq!(summary.files_completed, 2);
    assert_eq!(summary.counters.owners_created, 1);
    assert_eq!(summary.counters.lines_matched, 4);
}

#[test]
fn e2e_unreadable_files_are_abandoned_others_complete() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("mainlog");
    fs::write(&good, ROUND_TRIP_LINE).unwrap();
    let corrupt = dir.path().join("mainlog.2.gz");
    fs::write(&corrupt, "plain text pretending to be gzip\n").unwrap();
    let missing = dir.path().join("mainlog.3");
    let out = dir.path().join("emails");

    let summary = run(&config(vec![missing, good, corrupt], &out)).unwrap();

    assert_eq!(summary.files_total, 3);
    assert_eq!(summary.files_completed, 1);
    assert_eq!(summary.files_abandoned, 2);
    assert_eq!(output_lines(&out), ["alice@test.com,bob@other.com"]);
}

#[test]
fn e2e_many_files_with_single_worker() {
    let dir = tempfile::tempdir().unwrap();
    let files: Vec<PathBuf> = (0..12)
        .map(|i| {
            let path = dir.path().join(format!("mainlog.{i}"));
            fs::write(&path, format!("ts <= owner{i}@test.com x for peer{i}@other.com\n")).unwrap();
            path
        })
        .collect();
    let out = dir.path().join("emails");

    let cfg = CrunchConfig {
        concurrency: 1,
        ..config(files, &out)
    };
    let summary = run(&cfg).unwrap();

    assert_eq!(summary.files_completed, 12);
    assert_eq!(summary.owners_written, 12);
    assert_eq!(output_lines(&out).len(), 12);
}

// =============================================================================
// Fatal startup errors
// =============================================================================

#[test]
fn e2e_invalid_regex_aborts_before_output_is_created() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("mainlog");
    fs::write(&log, ROUND_TRIP_LINE).unwrap();
    let out = dir.path().join("emails");

    let cfg = CrunchConfig {
        exclusion_pattern: "(".to_string(),
        ..config(vec![log], &out)
    };
    let result = run(&cfg);

    assert!(
        matches!(
            result,
            Err(CrunchError::Pattern(PatternError::InvalidRegex {
                field: "exclusion",
                ..
            }))
        ),
        "expected InvalidRegex, got {result:?}"
    );
    assert!(!out.exists(), "output must not be created on a fatal error");
}

#[test]
fn e2e_zero_concurrency_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("emails");
    let cfg = CrunchConfig {
        concurrency: 0,
        ..config(Vec::new(), &out)
    };
    assert!(matches!(run(&cfg), Err(CrunchError::Config(_))));
    assert!(!out.exists());
}
