// EximCrunch - app/pool.rs
//
// Bounded worker pool: runs one job per file task with at most K jobs in
// flight.
//
// Backed by a dedicated rayon pool of exactly K threads (never the global
// pool, so the limit cannot be widened by other rayon users in the
// process). Jobs never call back into rayon, so each pool thread runs one
// job at a time and K threads means at most K open files.

use crate::core::model::FileTask;
use crate::util::constants;
use crate::util::error::{ConfigError, CrunchError};
use rayon::prelude::*;

/// Fixed-size pool for file workers.
pub struct WorkerPool {
    pool: rayon::ThreadPool,
    limit: usize,
}

impl WorkerPool {
    /// Build a pool admitting at most `limit` concurrent jobs.
    ///
    /// `limit` must be in `1..=ABSOLUTE_MAX_CONCURRENCY`; resolve the "auto"
    /// setting with [`resolve_concurrency`] first.
    pub fn new(limit: usize) -> Result<Self, CrunchError> {
        if !(1..=constants::ABSOLUTE_MAX_CONCURRENCY).contains(&limit) {
            return Err(ConfigError::ValueOutOfRange {
                field: "threads".to_string(),
                value: limit.to_string(),
                expected: format!("1-{}", constants::ABSOLUTE_MAX_CONCURRENCY),
            }
            .into());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(limit)
            .thread_name(|i| format!("crunch-worker-{i}"))
            .build()
            .map_err(|source| CrunchError::ThreadPool {
                threads: limit,
                source,
            })?;

        tracing::debug!(limit, "Worker pool started");
        Ok(Self { pool, limit })
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Run `job` once for every task and wait for all of them.
    ///
    /// Returns one result per task, in task order. Completion order is
    /// unspecified. Nothing is retried.
    pub fn run<F, T>(&self, tasks: &[FileTask], job: F) -> Vec<T>
    where
        F: Fn(&FileTask) -> T + Sync,
        T: Send,
    {
        self.pool
            .install(|| tasks.par_iter().with_max_len(1).map(&job).collect())
    }
}

/// Turn the configured thread count into a concrete pool size.
/// 0 means one worker per available CPU.
pub fn resolve_concurrency(configured: usize) -> usize {
    if configured > 0 {
        return configured;
    }
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(constants::FALLBACK_CONCURRENCY)
}
