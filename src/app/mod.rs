// EximCrunch - app/mod.rs
//
// Application layer: run orchestration, worker pool, per-file workers.
// Dependencies: core and platform layers.

pub mod crunch;
pub mod pool;
pub mod worker;
