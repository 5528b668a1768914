use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// The full configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub http: HttpConfig,
    pub localsocket: LocalSocketConfig,
    pub statistics: StatisticsConfig,
    pub storage: StorageConfig,
    pub shutdown: ShutdownConfig,
    pub services: BTreeMap<String, ServiceDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8081,
        }
    }
}

/// Address of the admin channel's Unix domain socket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LocalSocketConfig {
    pub file: PathBuf,
}

impl Default for LocalSocketConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("/tmp/simple-geojson-server.sock"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StatisticsConfig {
    pub file: PathBuf,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("statistics.json"),
        }
    }
}

/// Root directory for the per-index store directories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("LevelStore"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Upper bound on the drain; exceeding it is an unclean shutdown.
    pub drain_timeout_secs: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            drain_timeout_secs: 30,
        }
    }
}

/// One service entry as written in the configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceDefinition {
    pub file: PathBuf,
    /// Maximum query radius in meters.
    pub radius: f64,
    /// Maximum number of features per response.
    pub limit: usize,
}

/// Resolved, immutable configuration of one service.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub name: String,
    pub file: PathBuf,
    pub max_radius: f64,
    pub max_results: usize,
}
