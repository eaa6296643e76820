// EximCrunch - platform/mod.rs
//
// Platform abstraction layer: filesystem access and configuration files.
// Dependencies: standard library, glob, flate2, directories, toml.
// Must NOT depend on: app.

pub mod config;
pub mod fs;
