//! TOML-based configuration for the relay server.
//!
//! The file is optional and every field has a default, so an empty or absent
//! file is a valid configuration.  Example:
//!
//! ```toml
//! [server]
//! bind_address = "0.0.0.0"
//! outbound_queue_limit = 1024
//! log_level = "info"
//! ```
//!
//! # Serde default values
//!
//! Fields annotated with `#[serde(default = "some_fn")]` use the return value
//! of `some_fn()` when the field is absent from the TOML file.  A file that
//! sets only `log_level` therefore still gets the default bind address and
//! queue limit.

use std::net::IpAddr;
use std::path::{Path, PathBuf};

use relay_core::DEFAULT_OUTBOUND_QUEUE_LIMIT;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::history::HISTORY_CAPACITY;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but is not usable.
    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level relay configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RelayConfig {
    #[serde(default)]
    pub server: ServerConfig,
}

/// Listener and per-session settings shared by every relayed port.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// IP address every relay binds to.  `"0.0.0.0"` binds all interfaces.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Messages a session's channel may hold before it is dropped as too slow.
    /// The session's writer can hold up to this many more between writes, so
    /// the real per-session bound is twice this value.  Must be at least
    /// [`HISTORY_CAPACITY`].
    #[serde(default = "default_outbound_queue_limit")]
    pub outbound_queue_limit: usize,
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}
fn default_outbound_queue_limit() -> usize {
    DEFAULT_OUTBOUND_QUEUE_LIMIT
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            outbound_queue_limit: default_outbound_queue_limit(),
            log_level: default_log_level(),
        }
    }
}

impl RelayConfig {
    /// Checks values that deserialize fine but cannot be used.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the bind address is not an IP
    /// address, or if the queue limit could not hold a full history replay.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.bind_address.parse::<IpAddr>().is_err() {
            return Err(ConfigError::Invalid {
                field: "server.bind_address",
                reason: format!("'{}' is not an IP address", self.server.bind_address),
            });
        }
        if self.server.outbound_queue_limit < HISTORY_CAPACITY {
            return Err(ConfigError::Invalid {
                field: "server.outbound_queue_limit",
                reason: format!(
                    "{} is below the replay history size of {HISTORY_CAPACITY}",
                    self.server.outbound_queue_limit
                ),
            });
        }
        Ok(())
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Parses and validates configuration text.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] for malformed TOML and
/// [`ConfigError::Invalid`] for unusable values.
pub fn parse_config(content: &str) -> Result<RelayConfig, ConfigError> {
    let cfg: RelayConfig = toml::from_str(content)?;
    cfg.validate()?;
    Ok(cfg)
}

/// Loads `RelayConfig` from `path`, returning `RelayConfig::default()` if the
/// file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and the errors of [`parse_config`] for the file's content.
pub fn load_config(path: &Path) -> Result<RelayConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_config(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(RelayConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        // Arrange / Act
        let cfg = RelayConfig::default();

        // Assert
        assert_eq!(cfg.server.bind_address, "0.0.0.0");
        assert_eq!(cfg.server.outbound_queue_limit, 1024);
        assert_eq!(cfg.server.log_level, "info");
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(RelayConfig::default().validate().is_ok());
    }

    #[test]
    fn test_empty_file_yields_defaults() {
        let cfg = parse_config("").expect("empty config must parse");
        assert_eq!(cfg, RelayConfig::default());
    }

    #[test]
    fn test_partial_section_fills_missing_fields_with_defaults() {
        // Arrange
        let toml_str = "[server]\nlog_level = \"debug\"\n";

        // Act
        let cfg = parse_config(toml_str).expect("parse");

        // Assert
        assert_eq!(cfg.server.log_level, "debug");
        assert_eq!(cfg.server.bind_address, "0.0.0.0");
        assert_eq!(cfg.server.outbound_queue_limit, 1024);
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        // Arrange
        let mut cfg = RelayConfig::default();
        cfg.server.bind_address = "127.0.0.1".to_string();
        cfg.server.outbound_queue_limit = 4096;

        // Act
        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        let restored = parse_config(&toml_str).expect("parse");

        // Assert
        assert_eq!(cfg, restored);
    }

    #[test]
    fn test_queue_limit_below_history_capacity_is_rejected() {
        let result = parse_config("[server]\noutbound_queue_limit = 10\n");
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                field: "server.outbound_queue_limit",
                ..
            })
        ));
    }

    #[test]
    fn test_non_ip_bind_address_is_rejected() {
        let result = parse_config("[server]\nbind_address = \"localhost\"\n");
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                field: "server.bind_address",
                ..
            })
        ));
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let result = parse_config("[server\nlog_level = ");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_wrong_value_type_is_parse_error() {
        let result = parse_config("[server]\noutbound_queue_limit = \"lots\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let path = std::env::temp_dir().join("relay-server-config-that-does-not-exist.toml");
        let cfg = load_config(&path).expect("missing file must not be an error");
        assert_eq!(cfg, RelayConfig::default());
    }

    #[test]
    fn test_load_config_reads_file_from_disk() {
        // Arrange
        let path = std::env::temp_dir().join(format!(
            "relay-server-config-test-{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, "[server]\nbind_address = \"127.0.0.1\"\n").unwrap();

        // Act
        let result = load_config(&path);
        let _ = std::fs::remove_file(&path);

        // Assert
        assert_eq!(result.unwrap().server.bind_address, "127.0.0.1");
    }
}
