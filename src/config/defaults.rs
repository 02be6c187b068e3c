//! Default configuration values for the bridge

use serde::{Deserialize, Serialize};

/// Default configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigDefaults {
    pub server: ServerDefaults,
    pub file_channel: FileChannelDefaults,
    pub scanner: ScannerDefaults,
    pub inventory: InventoryDefaults,
    pub target: TargetDefaults,
    pub logging: LoggingDefaults,
}

/// Default socket channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerDefaults {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub read_timeout_ms: u64,
}

/// Default file channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileChannelDefaults {
    pub enabled: bool,
    pub path: String,
    pub poll_interval_ms: u64,
}

/// Default scanner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerDefaults {
    pub chunk_size: usize,
    pub search_window: usize,
}

/// Default inventory layout and bootstrap source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryDefaults {
    pub id_offset: usize,
    pub quantity_offset: usize,
    pub pointer_file: String,
}

/// Default attach/supervision timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetDefaults {
    pub attach_retry_ms: u64,
    pub liveness_poll_ms: u64,
}

/// Default logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingDefaults {
    pub level: String,
}

/// Returns the default configuration
pub fn default_config() -> ConfigDefaults {
    ConfigDefaults {
        server: ServerDefaults {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 8080,
            read_timeout_ms: 5000,
        },
        file_channel: FileChannelDefaults {
            enabled: true,
            path: "requests.txt".to_string(),
            poll_interval_ms: 200,
        },
        scanner: ScannerDefaults {
            chunk_size: 65536,         // 64KB
            search_window: 0x1000_0000, // 256MB
        },
        inventory: InventoryDefaults {
            id_offset: 0x8,
            quantity_offset: 0xC,
            pointer_file: "pointer.txt".to_string(),
        },
        target: TargetDefaults {
            attach_retry_ms: 2000,
            liveness_poll_ms: 1000,
        },
        logging: LoggingDefaults {
            level: "info".to_string(),
        },
    }
}
