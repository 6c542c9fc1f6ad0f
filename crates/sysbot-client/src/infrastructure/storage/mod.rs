//! Storage infrastructure: configuration file persistence.
//!
//! The `config` sub-module handles:
//!
//! - Reading the TOML configuration file from an explicit path or the
//!   platform-appropriate directory.
//! - Writing the configuration back to disk.
//! - Providing sensible defaults when the file does not exist yet (first run).

pub mod config;
