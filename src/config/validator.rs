//! Configuration validator for the bridge
//!
//! Validates configuration values to ensure they are within acceptable ranges.

use super::loader::{
    Config, ConfigError, FileChannelConfig, InventoryConfig, LoggingConfig, ScannerConfig,
    ServerConfig, TargetConfig,
};
use crate::memory::ByteSignature;

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates the entire configuration
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        Self::validate_server(&config.server)?;
        Self::validate_file_channel(&config.file_channel)?;
        Self::validate_scanner(&config.scanner)?;
        Self::validate_inventory(&config.inventory)?;
        Self::validate_target(&config.target)?;
        Self::validate_logging(&config.logging)?;
        Ok(())
    }

    fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
        if !server.enabled {
            return Ok(());
        }

        if server.port == 0 {
            return Err(ConfigError::Invalid("Server port cannot be 0".to_string()));
        }

        if server.read_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "Server read timeout must be greater than 0".to_string(),
            ));
        }

        server.socket_addr().map(|_| ())
    }

    fn validate_file_channel(channel: &FileChannelConfig) -> Result<(), ConfigError> {
        if !channel.enabled {
            return Ok(());
        }

        if channel.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "Command file path cannot be empty".to_string(),
            ));
        }

        if channel.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "Command file poll interval must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    fn validate_scanner(scanner: &ScannerConfig) -> Result<(), ConfigError> {
        if scanner.chunk_size == 0 || !scanner.chunk_size.is_power_of_two() {
            return Err(ConfigError::Invalid(
                "Chunk size must be a power of 2".to_string(),
            ));
        }

        if scanner.search_window == 0 {
            return Err(ConfigError::Invalid(
                "Search window must be greater than 0".to_string(),
            ));
        }

        if let Some(pattern) = &scanner.signature {
            let signature = ByteSignature::from_pattern(pattern)
                .map_err(|e| ConfigError::Invalid(format!("Invalid signature: {}", e)))?;
            if signature.len() > scanner.chunk_size {
                return Err(ConfigError::Invalid(
                    "Signature cannot be longer than the chunk size".to_string(),
                ));
            }
        }

        Ok(())
    }

    fn validate_inventory(inventory: &InventoryConfig) -> Result<(), ConfigError> {
        if inventory.id_offset == inventory.quantity_offset {
            return Err(ConfigError::Invalid(
                "Identifier and quantity fields cannot share an offset".to_string(),
            ));
        }

        if inventory.id_offset.abs_diff(inventory.quantity_offset) < 4 {
            return Err(ConfigError::Invalid(
                "Identifier and quantity fields overlap".to_string(),
            ));
        }

        Ok(())
    }

    fn validate_target(target: &TargetConfig) -> Result<(), ConfigError> {
        if target.attach_retry_ms == 0 || target.liveness_poll_ms == 0 {
            return Err(ConfigError::Invalid(
                "Attach retry and liveness poll intervals must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Invalid log level: {}. Must be one of: {:?}",
                logging.level, valid_levels
            )));
        }

        Ok(())
    }
}

/// Validates a configuration
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    ConfigValidator::validate(config)
}
