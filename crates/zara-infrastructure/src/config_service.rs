//! Configuration loading.
//!
//! Reads `HubConfig` from `config.toml`. A missing file means defaults; a
//! malformed file is an error rather than a silent reset.

use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, info};

use zara_core::config::HubConfig;
use zara_core::error::{CoreError, Result};

use crate::paths::HubPaths;

pub struct ConfigService;

impl ConfigService {
    /// Loads the configuration from the platform config file.
    pub async fn load() -> Result<HubConfig> {
        let path = HubPaths::config_file()?;
        Self::load_from(&path).await
    }

    pub async fn load_from(path: &Path) -> Result<HubConfig> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                return Ok(HubConfig::default());
            }
            Err(err) => return Err(err.into()),
        };

        let config: HubConfig = toml::from_str(&content).map_err(|e| {
            CoreError::config(format!(
                "Failed to parse config TOML from '{}': {}",
                path.display(),
                e
            ))
        })?;
        info!(path = %path.display(), "Loaded hub configuration");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_is_default() {
        let temp_dir = TempDir::new().unwrap();
        let config = ConfigService::load_from(&temp_dir.path().join("config.toml"))
            .await
            .unwrap();
        assert_eq!(config, HubConfig::default());
    }

    #[tokio::test]
    async fn test_reads_values() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            "admin_email = \"boss@example.com\"\nlimit_enabled_by_default = false\n",
        )
        .unwrap();

        let config = ConfigService::load_from(&path).await.unwrap();
        assert_eq!(config.admin_email, "boss@example.com");
        assert!(!config.limit_enabled_by_default);
        assert_eq!(config.default_daily_limit, 10);
    }

    #[tokio::test]
    async fn test_malformed_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "default_daily_limit = \"ten\"").unwrap();

        let err = ConfigService::load_from(&path).await.unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }
}
