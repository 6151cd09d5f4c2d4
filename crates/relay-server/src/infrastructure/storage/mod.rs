//! Storage infrastructure: configuration file loading.
//!
//! The relay keeps no other state on disk.  The `config` sub-module reads the
//! optional TOML file passed with `--config` and supplies defaults for every
//! field that is missing, so the server runs with no file at all.

pub mod config;
