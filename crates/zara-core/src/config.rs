//! Hub configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::credit::{CreditConfig, DEFAULT_DAILY_LIMIT};

/// Settings read from `config.toml`. Every field is optional in the file.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct HubConfig {
    /// Address that is always granted the admin role.
    pub admin_email: String,
    /// Hex SHA-256 digest of the secondary admin password. Without it the
    /// admin challenge cannot be passed.
    pub admin_challenge_sha256: Option<String>,
    /// Overrides the platform data directory.
    pub storage_dir: Option<PathBuf>,
    pub default_daily_limit: u32,
    pub limit_enabled_by_default: bool,
    pub log_level: String,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            admin_email: "admin@zaraaihub.com".to_string(),
            admin_challenge_sha256: None,
            storage_dir: None,
            default_daily_limit: DEFAULT_DAILY_LIMIT,
            limit_enabled_by_default: true,
            log_level: "info".to_string(),
        }
    }
}

impl HubConfig {
    /// Credit settings used until an admin stores different ones.
    pub fn default_credit_config(&self) -> CreditConfig {
        CreditConfig {
            daily_limit: self.default_daily_limit,
            limit_enabled: self.limit_enabled_by_default,
        }
    }
}
