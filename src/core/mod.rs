// EximCrunch - core/mod.rs
//
// Core business logic layer.
// Dependencies: util layer, regex, dashmap, tracing.
// Must NOT depend on: app, platform, or touch the filesystem directly.

pub mod aggregate;
pub mod classify;
pub mod export;
pub mod model;
pub mod parser;
