//! Server and world configuration

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::materialize::DEFAULT_BATCH_SIZE;
use crate::worldgen::DEFAULT_SEED;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub world: WorldConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// The only inputs that affect generated terrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_seed")]
    pub seed: i32,
}

fn default_width() -> u32 {
    200
}

fn default_height() -> u32 {
    120
}

fn default_seed() -> i32 {
    DEFAULT_SEED
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            seed: default_seed(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub init_on_boot: bool,
    /// Key required by the reset endpoint. Reset is refused when unset.
    #[serde(default)]
    pub admin_key: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            init_on_boot: false,
            admin_key: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default = "default_data_dir")]
    pub path: PathBuf,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            path: default_data_dir(),
            batch_size: default_batch_size(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl Config {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(text).context("Failed to parse config YAML")?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialise config")
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.world.width == 0 || self.world.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "world must be at least 1x1, got {}x{}",
                self.world.width, self.world.height
            )));
        }
        if self.storage.batch_size == 0 {
            return Err(ConfigError::Invalid(
                "storage.batch_size must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Whether `serve` generates before listening. A memory store starts empty
    /// on every boot, so it always does.
    pub fn populate_on_boot(&self) -> bool {
        self.server.init_on_boot || self.storage.backend == StoreBackend::Memory
    }

    /// `init-world` writes the world and exits, which only makes sense for a
    /// store that outlives the process.
    pub fn check_init_world(&self) -> Result<(), ConfigError> {
        match self.storage.backend {
            StoreBackend::Memory => Err(ConfigError::Invalid(
                "init-world needs a persistent store, e.g. --store json".into(),
            )),
            StoreBackend::Json => Ok(()),
        }
    }
}

pub struct ConfigLoader {
    base_dir: PathBuf,
}

impl ConfigLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    /// Read a YAML config, or fall back to defaults when no file is given.
    pub fn load(&self, file: Option<impl AsRef<Path>>) -> Result<Config> {
        let Some(file) = file else {
            return Ok(Config::default());
        };
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Config::from_yaml_str(&data).with_context(|| format!("Failed to parse {}", path.display()))
    }
}
