//! Storage infrastructure: configuration file persistence.
//!
//! A thin adapter between the application and the file system.  The
//! `config` sub-module reads and writes the TOML configuration file in the
//! platform-appropriate directory, supplying defaults when the file does
//! not exist yet (first run) or predates a newer field.

pub mod config;
