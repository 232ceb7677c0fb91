//! Store-backed global settings.

use std::collections::BTreeSet;

use async_trait::async_trait;

use zara_core::credit::CreditConfig;
use zara_core::error::Result;
use zara_core::state::StateRepository;

use crate::storage::{PersistentStore, keys};

/// Credit settings and seen announcements, each under its own key.
pub struct StoreStateRepository {
    store: PersistentStore,
}

impl StoreStateRepository {
    pub fn new(store: PersistentStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl StateRepository for StoreStateRepository {
    async fn get_credit_config(&self, fallback: CreditConfig) -> CreditConfig {
        CreditConfig {
            daily_limit: self.store.read(keys::DAILY_LIMIT, fallback.daily_limit).await,
            limit_enabled: self
                .store
                .read(keys::LIMIT_ENABLED, fallback.limit_enabled)
                .await,
        }
    }

    async fn save_credit_config(&self, config: CreditConfig) -> Result<()> {
        self.store.write(keys::DAILY_LIMIT, &config.daily_limit).await?;
        self.store
            .write(keys::LIMIT_ENABLED, &config.limit_enabled)
            .await?;
        Ok(())
    }

    async fn get_seen_announcements(&self) -> BTreeSet<String> {
        self.store
            .read(keys::SEEN_ANNOUNCEMENTS, BTreeSet::new())
            .await
    }

    async fn save_seen_announcements(&self, seen: &BTreeSet<String>) -> Result<()> {
        self.store.write(keys::SEEN_ANNOUNCEMENTS, seen).await?;
        Ok(())
    }
}
