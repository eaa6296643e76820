// EximCrunch - lib.rs
//
// Library entry point, exposing the crunching engine for integration
// testing and programmatic use.
//
// Command-line parsing lives in `main.rs` and is not part of the library
// surface.

pub mod app;
pub mod core;
pub mod platform;
pub mod util;
