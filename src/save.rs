//! Key/version persistence of the full game state.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SaveConfig;
use crate::state::GameState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveFile {
    pub key: String,
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub state: GameState,
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("save io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("save encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct SaveStore {
    dir: PathBuf,
    key: String,
    version: u32,
}

impl SaveStore {
    pub fn new(dir: impl Into<PathBuf>, key: impl Into<String>, version: u32) -> Self {
        Self {
            dir: dir.into(),
            key: key.into(),
            version,
        }
    }

    pub fn from_config(config: &SaveConfig) -> Self {
        Self::new(config.dir.clone(), config.key.clone(), config.version)
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", self.key))
    }

    /// Write the state, replacing any previous save in one rename.
    pub fn write(&self, state: &GameState) -> Result<PathBuf, SaveError> {
        fs::create_dir_all(&self.dir).map_err(|source| io_error(&self.dir, source))?;
        let file = SaveFile {
            key: self.key.clone(),
            version: self.version,
            saved_at: Utc::now(),
            state: state.clone(),
        };
        let json = serde_json::to_string_pretty(&file)?;

        let path = self.path();
        let tmp = self.dir.join(format!(".{}.json.tmp", self.key));
        fs::write(&tmp, json).map_err(|source| io_error(&tmp, source))?;
        fs::rename(&tmp, &path).map_err(|source| io_error(&path, source))?;
        Ok(path)
    }

    /// Read the save if one exists for this key and version.
    ///
    /// A save written under another key or version is ignored rather than
    /// migrated.
    pub fn load(&self) -> Result<Option<SaveFile>, SaveError> {
        let path = self.path();
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(io_error(&path, source)),
        };

        let header: SaveHeader = serde_json::from_str(&text)?;
        if header.key != self.key || header.version != self.version {
            warn!(
                "ignoring save {} (key '{}' v{}, expected '{}' v{})",
                path.display(),
                header.key,
                header.version,
                self.key,
                self.version
            );
            return Ok(None);
        }

        let file: SaveFile = serde_json::from_str(&text)?;
        info!("loaded save {} from {}", path.display(), file.saved_at);
        Ok(Some(file))
    }

    pub fn clear(&self) -> Result<bool, SaveError> {
        let path = self.path();
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(io_error(&path, source)),
        }
    }
}

/// Read before the full body so an incompatible schema is not an error.
#[derive(Deserialize)]
struct SaveHeader {
    key: String,
    version: u32,
}

fn io_error(path: &Path, source: std::io::Error) -> SaveError {
    SaveError::Io {
        path: path.to_path_buf(),
        source,
    }
}
