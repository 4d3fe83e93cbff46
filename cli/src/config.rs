use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use gala_node::metrics::DEFAULT_METRICS_PORT;
use gala_node::store::CHAIN_STORE_DEFAULT_CACHE_MB;

const CONFIG_DIR: &str = ".gala";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NodeConfig {
    pub node: NodeSection,
    pub storage: StorageConfig,
    pub consensus: ConsensusConfig,
    pub metrics: MetricsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NodeSection {
    pub home: String,
    pub chain_id: String,
    pub moniker: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StorageConfig {
    pub rocksdb: RocksDbConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RocksDbConfig {
    pub primary_path: String,
    pub cache_size_mb: u64,
}

/// Settings for the single-node development block producer.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ConsensusConfig {
    pub block_interval_ms: u64,
    pub max_blocks: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    pub log_level: LogLevel,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// `env_logger` filter scoped to the node and cli crates.
    pub fn filter(&self) -> String {
        format!("gala_node={0},gala_cli={0}", self.as_str())
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node: NodeSection {
                home: format!("~/{CONFIG_DIR}"),
                chain_id: "galactica-dev".to_string(),
                moniker: "galad".to_string(),
            },
            storage: StorageConfig {
                rocksdb: RocksDbConfig {
                    primary_path: format!("~/{CONFIG_DIR}/data"),
                    cache_size_mb: CHAIN_STORE_DEFAULT_CACHE_MB as u64,
                },
            },
            consensus: ConsensusConfig {
                block_interval_ms: 1000,
                max_blocks: None,
            },
            metrics: MetricsConfig {
                enabled: true,
                port: DEFAULT_METRICS_PORT,
            },
            logging: LoggingConfig {
                log_level: LogLevel::Info,
            },
        }
    }
}

impl NodeConfig {
    pub fn load(config_path: &Option<PathBuf>) -> Result<Self, NodeConfigError> {
        match config_path {
            Some(path) => {
                let expanded_path = expand_path(path);
                if !expanded_path.exists() {
                    return Err(NodeConfigError::CustomConfigFileNotFound(
                        expanded_path.display().to_string(),
                    ));
                }
                Self::load_from_path(expanded_path)
            }
            None => Self::load_from_path(default_config_path()?),
        }
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, NodeConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(NodeConfigError::ConfigFileNotFound);
        }

        let contents = fs::read_to_string(path).map_err(NodeConfigError::FileReadError)?;
        let config: NodeConfig = toml::from_str(&contents).map_err(NodeConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Writes the default configuration to `~/.gala/config.toml`.
    pub fn create_default() -> Result<Self, NodeConfigError> {
        let config = Self::default();
        let path = default_config_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| NodeConfigError::DefaultConfigCreationFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(&config)
            .map_err(|e| NodeConfigError::DefaultConfigCreationFailed(e.to_string()))?;
        fs::write(&path, contents)
            .map_err(|e| NodeConfigError::DefaultConfigCreationFailed(e.to_string()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), NodeConfigError> {
        if self.node.chain_id.trim().is_empty() {
            return Err(NodeConfigError::InvalidValue(
                "node.chain_id cannot be empty".to_string(),
            ));
        }
        if self.consensus.block_interval_ms == 0 {
            return Err(NodeConfigError::InvalidValue(
                "consensus.block_interval_ms must be positive".to_string(),
            ));
        }
        if self.metrics.enabled && self.metrics.port == 0 {
            return Err(NodeConfigError::InvalidValue(
                "metrics.port must be non-zero when metrics are enabled".to_string(),
            ));
        }
        Ok(())
    }

    pub fn home_dir(&self) -> PathBuf {
        expand_path(Path::new(&self.node.home))
    }

    pub fn data_dir(&self) -> PathBuf {
        expand_path(Path::new(&self.storage.rocksdb.primary_path))
    }

    pub fn genesis_path(&self) -> PathBuf {
        self.home_dir().join("config").join("genesis.json")
    }
}

fn expand_path(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
}

fn default_config_path() -> Result<PathBuf, NodeConfigError> {
    let home = dirs::home_dir().ok_or(NodeConfigError::HomeDirectoryNotFound)?;
    Ok(home.join(CONFIG_DIR).join(CONFIG_FILE))
}

#[derive(Debug)]
pub enum NodeConfigError {
    ConfigFileNotFound,
    CustomConfigFileNotFound(String),
    InvalidValue(String),
    HomeDirectoryNotFound,
    FileReadError(std::io::Error),
    ParseError(toml::de::Error),
    DefaultConfigCreationFailed(String),
}

impl fmt::Display for NodeConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            NodeConfigError::ConfigFileNotFound => write!(f, "config.toml not found"),
            NodeConfigError::CustomConfigFileNotFound(path) => {
                write!(f, "Config file not found at: {path}")
            }
            NodeConfigError::InvalidValue(msg) => write!(f, "Invalid configuration: {msg}"),
            NodeConfigError::HomeDirectoryNotFound => write!(f, "Could not determine home directory"),
            NodeConfigError::FileReadError(e) => write!(f, "Failed to read config file: {e}"),
            NodeConfigError::ParseError(e) => write!(f, "Failed to parse config file: {e}"),
            NodeConfigError::DefaultConfigCreationFailed(msg) => {
                write!(f, "Failed to create default config: {msg}")
            }
        }
    }
}

impl std::error::Error for NodeConfigError {}
