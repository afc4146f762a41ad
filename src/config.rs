//! # Configuration Management
//!
//! Centralized configuration for a node and the overlays bound to it.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Direct instantiation with defaults
//! - Environment overrides via `from_env()` (`PEERWIRE_*` variables)
//!
//! Validation returns human-readable messages rather than failing on the first
//! problem, so a bad config file can be fixed in one pass.

use crate::core::opcode::{DEFAULT_REGISTRY_CAPACITY, OPCODE_SIZE};
use crate::error::{ProtocolError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::Level;

/// Max accepted inbound envelope size (16 MB)
pub const MAX_ENVELOPE_SIZE: usize = 16 * 1024 * 1024;

/// Max accepted gossip payload size (1 MB)
pub const MAX_GOSSIP_SIZE: usize = 1024 * 1024;

/// Main configuration structure that contains all configurable settings
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct NetworkConfig {
    /// Node-level configuration
    #[serde(default)]
    pub node: NodeConfig,

    /// Gossip overlay configuration
    #[serde(default)]
    pub gossip: GossipConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl NetworkConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables on top of the defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("PEERWIRE_BIND_ADDRESS") {
            config.node.bind_address = addr;
        }

        if let Ok(capacity) = std::env::var("PEERWIRE_REGISTRY_CAPACITY") {
            config.node.registry_capacity = capacity.parse::<usize>().map_err(|e| {
                ProtocolError::ConfigError(format!("Invalid PEERWIRE_REGISTRY_CAPACITY: {e}"))
            })?;
        }

        if let Ok(size) = std::env::var("PEERWIRE_MAX_ENVELOPE_SIZE") {
            config.node.max_envelope_size = size.parse::<usize>().map_err(|e| {
                ProtocolError::ConfigError(format!("Invalid PEERWIRE_MAX_ENVELOPE_SIZE: {e}"))
            })?;
        }

        if let Ok(size) = std::env::var("PEERWIRE_MAX_GOSSIP_SIZE") {
            config.gossip.max_gossip_size = size.parse::<usize>().map_err(|e| {
                ProtocolError::ConfigError(format!("Invalid PEERWIRE_MAX_GOSSIP_SIZE: {e}"))
            })?;
        }

        if let Ok(level) = std::env::var("PEERWIRE_LOG_LEVEL") {
            config.logging.log_level = level.parse::<Level>().map_err(|_| {
                ProtocolError::ConfigError(format!("Invalid PEERWIRE_LOG_LEVEL: {level}"))
            })?;
        }

        Ok(config)
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        errors.extend(self.node.validate());
        errors.extend(self.gossip.validate());

        if self.gossip.max_gossip_size + OPCODE_SIZE > self.node.max_envelope_size {
            errors.push(format!(
                "Gossip max size {} does not fit in an envelope of {} bytes",
                self.gossip.max_gossip_size, self.node.max_envelope_size
            ));
        }

        errors.extend(self.logging.validate());

        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ProtocolError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

/// Node-level configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NodeConfig {
    /// Address the transport listens on (e.g., "127.0.0.1:9000")
    pub bind_address: String,

    /// Number of shapes the registry reserves room for
    pub registry_capacity: usize,

    /// Largest inbound envelope handed to the codec, opcode included
    pub max_envelope_size: usize,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            bind_address: String::from("127.0.0.1:9000"),
            registry_capacity: DEFAULT_REGISTRY_CAPACITY,
            max_envelope_size: MAX_ENVELOPE_SIZE,
        }
    }
}

impl NodeConfig {
    /// Validate node configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.bind_address.is_empty() {
            errors.push("Bind address cannot be empty".to_string());
        } else if self.bind_address.parse::<std::net::SocketAddr>().is_err() {
            errors.push(format!(
                "Invalid bind address format: '{}' (expected format: '0.0.0.0:9000')",
                self.bind_address
            ));
        }

        if self.registry_capacity == 0 {
            errors.push("Registry capacity must be greater than 0".to_string());
        } else if self.registry_capacity > 65_536 {
            errors.push(format!(
                "Registry capacity too large: {} (maximum: 65536)",
                self.registry_capacity
            ));
        }

        if self.max_envelope_size < OPCODE_SIZE {
            errors.push(format!(
                "Max envelope size too small: {} bytes (minimum: {OPCODE_SIZE})",
                self.max_envelope_size
            ));
        } else if self.max_envelope_size > 100 * 1024 * 1024 {
            errors.push(format!(
                "Max envelope size too large: {} bytes (maximum recommended: 100 MB)",
                self.max_envelope_size
            ));
        }

        errors
    }
}

/// Gossip overlay configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GossipConfig {
    /// Largest gossip payload accepted from a peer
    pub max_gossip_size: usize,
}

impl Default for GossipConfig {
    fn default() -> Self {
        Self {
            max_gossip_size: MAX_GOSSIP_SIZE,
        }
    }
}

impl GossipConfig {
    /// Validate gossip configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.max_gossip_size == 0 {
            errors.push("Max gossip size must be greater than 0".to_string());
        }

        errors
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    /// Log level, overridden by `RUST_LOG` when set
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("peerwire"),
            log_level: Level::INFO,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        errors
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let level_str = match *level {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };
        level_str.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}
