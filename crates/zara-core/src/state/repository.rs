//! State repository trait.

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::credit::CreditConfig;
use crate::error::Result;

/// Repository for global credit settings and per-device seen announcements.
///
/// Getters never fail: unreadable values fall back to defaults.
#[async_trait]
pub trait StateRepository: Send + Sync {
    /// Stored credit settings, with `fallback` filling in missing values.
    async fn get_credit_config(&self, fallback: CreditConfig) -> CreditConfig;

    async fn save_credit_config(&self, config: CreditConfig) -> Result<()>;

    async fn get_seen_announcements(&self) -> BTreeSet<String>;

    async fn save_seen_announcements(&self, seen: &BTreeSet<String>) -> Result<()>;
}
