//! Store-backed announcement repository.

use async_trait::async_trait;
use version_migrate::Migrator;

use zara_core::announcement::{Announcement, AnnouncementRepository};
use zara_core::error::{CoreError, Result};

use crate::dto::{AnnouncementV1_1_0, create_announcement_migrator};
use crate::storage::{PersistentStore, keys};
use crate::store_repository::StoreRepository;
use crate::versioned::load_records;

/// Keeps announcements, with their comment trees, under `app-announcements`.
pub struct StoreAnnouncementRepository {
    store: PersistentStore,
    migrator: Migrator,
}

impl StoreAnnouncementRepository {
    pub fn new(store: PersistentStore) -> Result<Self> {
        Ok(Self {
            store,
            migrator: create_announcement_migrator()?,
        })
    }
}

impl StoreRepository for StoreAnnouncementRepository {
    const STORAGE_KEY: &'static str = keys::ANNOUNCEMENTS;
    const ENTITY_NAME: &'static str = "announcement";

    fn store(&self) -> &PersistentStore {
        &self.store
    }

    fn migrator(&self) -> &Migrator {
        &self.migrator
    }
}

#[async_trait]
impl AnnouncementRepository for StoreAnnouncementRepository {
    async fn get_all(&self) -> Result<Vec<Announcement>> {
        let loaded: Option<Vec<Announcement>> =
            load_records(self.store(), Self::STORAGE_KEY, |record| {
                self.migrator().load_flat_from(Self::ENTITY_NAME, record)
            })
            .await;
        Ok(loaded.unwrap_or_else(|| vec![Announcement::launch()]))
    }

    async fn save_all(&self, announcements: &[Announcement]) -> Result<()> {
        let dtos: Vec<AnnouncementV1_1_0> = announcements.iter().map(|a| a.into()).collect();
        let json_str = self.migrator().save_vec_flat(dtos).map_err(|e| {
            CoreError::migration(format!("Failed to serialize announcements: {}", e))
        })?;
        self.store()
            .write_raw(Self::STORAGE_KEY, &json_str)
            .await?;
        Ok(())
    }
}
