//! Configuration loader for the bridge
//!
//! Handles loading configuration from TOML files and merging with defaults.

use super::defaults::default_config;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Config file looked up when no path is given on the command line
pub const DEFAULT_CONFIG_FILE: &str = "memory-bridge.toml";

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_server")]
    pub server: ServerConfig,

    #[serde(default = "default_file_channel")]
    pub file_channel: FileChannelConfig,

    #[serde(default = "default_scanner")]
    pub scanner: ScannerConfig,

    #[serde(default = "default_inventory")]
    pub inventory: InventoryConfig,

    #[serde(default = "default_target")]
    pub target: TargetConfig,

    #[serde(default = "default_logging")]
    pub logging: LoggingConfig,
}

/// Socket channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_enabled")]
    pub enabled: bool,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

impl ServerConfig {
    /// Parsed listen address
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| {
                ConfigError::Invalid(format!(
                    "Invalid listen address {}:{}",
                    self.host, self.port
                ))
            })
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

/// File channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileChannelConfig {
    #[serde(default = "default_file_enabled")]
    pub enabled: bool,
    #[serde(default = "default_file_path")]
    pub path: PathBuf,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl FileChannelConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Scanner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_search_window")]
    pub search_window: usize,
    /// IDA-style pattern, e.g. `"48 8B 05 ?? ?? ?? ??"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

/// Inventory layout and pointer bootstrap
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryConfig {
    #[serde(default = "default_id_offset")]
    pub id_offset: usize,
    #[serde(default = "default_quantity_offset")]
    pub quantity_offset: usize,
    #[serde(default = "default_pointer_file")]
    pub pointer_file: PathBuf,
}

/// Attach and supervision timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    #[serde(default = "default_attach_retry_ms")]
    pub attach_retry_ms: u64,
    #[serde(default = "default_liveness_poll_ms")]
    pub liveness_poll_ms: u64,
}

impl TargetConfig {
    pub fn attach_retry(&self) -> Duration {
        Duration::from_millis(self.attach_retry_ms)
    }

    pub fn liveness_poll(&self) -> Duration {
        Duration::from_millis(self.liveness_poll_ms)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Configuration loader
pub struct ConfigLoader {
    config_path: PathBuf,
}

impl ConfigLoader {
    /// Creates a new configuration loader
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        ConfigLoader {
            config_path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Loads configuration from file
    pub fn load(&self) -> Result<Config, ConfigError> {
        if !self.config_path.exists() {
            return Err(ConfigError::FileNotFound(
                self.config_path.display().to_string(),
            ));
        }

        let contents = fs::read_to_string(&self.config_path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Loads configuration, falling back to defaults only when the file is absent
    ///
    /// A file that exists but does not parse is still an error.
    pub fn load_or_default(&self) -> Result<Config, ConfigError> {
        match self.load() {
            Err(ConfigError::FileNotFound(_)) => Ok(Config::default()),
            other => other,
        }
    }

    /// Saves configuration to file
    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, contents)?;
        Ok(())
    }
}

/// Loads configuration from `path`, or from [`DEFAULT_CONFIG_FILE`]
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let loader = ConfigLoader::new(path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE)));
    loader.load_or_default()
}

// Default functions for serde
fn default_server() -> ServerConfig {
    let defaults = default_config().server;
    ServerConfig {
        enabled: defaults.enabled,
        host: defaults.host,
        port: defaults.port,
        read_timeout_ms: defaults.read_timeout_ms,
    }
}

fn default_file_channel() -> FileChannelConfig {
    let defaults = default_config().file_channel;
    FileChannelConfig {
        enabled: defaults.enabled,
        path: PathBuf::from(defaults.path),
        poll_interval_ms: defaults.poll_interval_ms,
    }
}

fn default_scanner() -> ScannerConfig {
    let defaults = default_config().scanner;
    ScannerConfig {
        chunk_size: defaults.chunk_size,
        search_window: defaults.search_window,
        signature: None,
    }
}

fn default_inventory() -> InventoryConfig {
    let defaults = default_config().inventory;
    InventoryConfig {
        id_offset: defaults.id_offset,
        quantity_offset: defaults.quantity_offset,
        pointer_file: PathBuf::from(defaults.pointer_file),
    }
}

fn default_target() -> TargetConfig {
    let defaults = default_config().target;
    TargetConfig {
        attach_retry_ms: defaults.attach_retry_ms,
        liveness_poll_ms: defaults.liveness_poll_ms,
    }
}

fn default_logging() -> LoggingConfig {
    LoggingConfig {
        level: default_config().logging.level,
    }
}

// Individual field defaults
fn default_server_enabled() -> bool {
    default_config().server.enabled
}

fn default_host() -> String {
    default_config().server.host
}

fn default_port() -> u16 {
    default_config().server.port
}

fn default_read_timeout_ms() -> u64 {
    default_config().server.read_timeout_ms
}

fn default_file_enabled() -> bool {
    default_config().file_channel.enabled
}

fn default_file_path() -> PathBuf {
    PathBuf::from(default_config().file_channel.path)
}

fn default_poll_interval_ms() -> u64 {
    default_config().file_channel.poll_interval_ms
}

fn default_chunk_size() -> usize {
    default_config().scanner.chunk_size
}

fn default_search_window() -> usize {
    default_config().scanner.search_window
}

fn default_id_offset() -> usize {
    default_config().inventory.id_offset
}

fn default_quantity_offset() -> usize {
    default_config().inventory.quantity_offset
}

fn default_pointer_file() -> PathBuf {
    PathBuf::from(default_config().inventory.pointer_file)
}

fn default_attach_retry_ms() -> u64 {
    default_config().target.attach_retry_ms
}

fn default_liveness_poll_ms() -> u64 {
    default_config().target.liveness_poll_ms
}

fn default_log_level() -> String {
    default_config().logging.level
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: default_server(),
            file_channel: default_file_channel(),
            scanner: default_scanner(),
            inventory: default_inventory(),
            target: default_target(),
            logging: default_logging(),
        }
    }
}
