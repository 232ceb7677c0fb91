//! Path management for hub configuration and data files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/zara-hub/          # Config directory
//! └── config.toml              # Hub configuration
//!
//! ~/.local/share/zara-hub/     # Data directory
//! └── store/                   # One <key>.json per persisted key
//! ```

use std::path::PathBuf;

use zara_core::config::HubConfig;
use zara_core::error::CoreError;

const APP_DIR: &str = "zara-hub";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Platform directory could not be determined.
    DirNotFound(&'static str),
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::DirNotFound(kind) => write!(f, "Cannot find {} directory", kind),
        }
    }
}

impl std::error::Error for PathError {}

impl From<PathError> for CoreError {
    fn from(err: PathError) -> Self {
        CoreError::config(err.to_string())
    }
}

pub struct HubPaths;

impl HubPaths {
    /// Returns the hub configuration directory (e.g. `~/.config/zara-hub/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::DirNotFound("config"))
    }

    /// Returns the hub data directory (e.g. `~/.local/share/zara-hub/`).
    pub fn data_dir() -> Result<PathBuf, PathError> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::DirNotFound("data"))
    }

    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Directory for the file storage backend, honouring `storage_dir`.
    pub fn store_dir(config: &HubConfig) -> Result<PathBuf, PathError> {
        match &config.storage_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Self::data_dir()?.join("store")),
        }
    }
}
