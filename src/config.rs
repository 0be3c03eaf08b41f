//! Game configuration loaded from YAML.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{Catalog, CatalogError};
use crate::grid::tile_count;
use crate::resources::ResourceBundle;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_starting_resources")]
    pub starting_resources: ResourceBundle,
    #[serde(default)]
    pub save: SaveConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub catalog: Catalog,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 9,
            height: 9,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveConfig {
    #[serde(default = "default_save_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_save_key")]
    pub key: String,
    #[serde(default = "default_save_version")]
    pub version: u32,
    /// Persist every N ticks; 1 saves after every change, 0 only saves after
    /// purchases and upgrades.
    #[serde(default = "default_save_interval_ticks")]
    pub interval_ticks: u64,
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            dir: default_save_dir(),
            key: default_save_key(),
            version: default_save_version(),
            interval_ticks: default_save_interval_ticks(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_name() -> String {
    "default_realm".to_string()
}

fn default_seed() -> u64 {
    7
}

fn default_tick_interval_ms() -> u64 {
    50
}

fn default_starting_resources() -> ResourceBundle {
    ResourceBundle {
        gold: 150.0,
        ..ResourceBundle::default()
    }
}

fn default_save_dir() -> PathBuf {
    PathBuf::from("saves")
}

fn default_save_key() -> String {
    "castle-idle".to_string()
}

fn default_save_version() -> u32 {
    1
}

fn default_save_interval_ticks() -> u64 {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid catalog: {0}")]
    Catalog(#[from] CatalogError),
    #[error("config validation error: {0}")]
    Validation(String),
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            seed: default_seed(),
            grid: GridConfig::default(),
            tick_interval_ms: default_tick_interval_ms(),
            starting_resources: default_starting_resources(),
            save: SaveConfig::default(),
            logging: LoggingConfig::default(),
            catalog: Catalog::default(),
        }
    }
}

impl GameConfig {
    pub fn from_yaml_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml_path(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Validation("config must define a name".into()));
        }
        tile_count(self.grid.width, self.grid.height)
            .map_err(|err| ConfigError::Validation(err.to_string()))?;
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Validation(
                "tick_interval_ms must be greater than zero".into(),
            ));
        }
        if self.save.key.trim().is_empty() {
            return Err(ConfigError::Validation("save key must not be empty".into()));
        }
        self.catalog.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = GameConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.grid, GridConfig { width: 9, height: 9 });
        assert_eq!(config.save.version, 1);
        assert_eq!(config.save.interval_ticks, 1);
    }

    #[test]
    fn minimal_yaml_fills_defaults() {
        let config = GameConfig::from_yaml_str("name: tiny\ngrid:\n  width: 3\n  height: 5\n")
            .expect("config parses");
        assert_eq!(config.name, "tiny");
        assert_eq!(config.grid, GridConfig { width: 3, height: 5 });
        assert_eq!(config.tick_interval_ms, 50);
        assert_eq!(config.catalog, Catalog::default());
        assert_eq!(config.starting_resources.gold, 150.0);
    }

    #[test]
    fn zero_tick_interval_is_rejected() {
        let err = GameConfig::from_yaml_str("tick_interval_ms: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn oversized_grid_is_rejected() {
        let err = GameConfig::from_yaml_str("grid: {width: 65536, height: 65536}\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("65536x65536"));
    }

    #[test]
    fn empty_grid_is_rejected() {
        let err = GameConfig::from_yaml_str("grid: {width: 0, height: 4}\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn invalid_catalog_is_rejected() {
        let mut config = GameConfig::default();
        config.catalog.castle.level_multiplier = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::Catalog(_))));
    }

    #[test]
    fn yaml_round_trip_preserves_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("realm.yaml");
        let mut config = GameConfig::default();
        config.name = "round_trip".into();
        config.seed = 99;
        config.to_yaml_path(&path).unwrap();

        let loaded = GameConfig::from_yaml_path(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = GameConfig::from_yaml_path("does/not/exist.yaml").unwrap_err();
        assert!(err.to_string().contains("does/not/exist.yaml"));
    }
}
