//! Store-backed custom persona repository.

use async_trait::async_trait;
use version_migrate::Migrator;

use zara_core::error::{CoreError, Result};
use zara_core::persona::{Persona, PersonaRepository};

use crate::dto::{PersonaV2_0_0, create_persona_migrator};
use crate::storage::{PersistentStore, keys};
use crate::store_repository::StoreRepository;
use crate::versioned::load_records;

/// Keeps custom personas as flat versioned records under `custom-personas`.
pub struct StorePersonaRepository {
    store: PersistentStore,
    migrator: Migrator,
}

impl StorePersonaRepository {
    pub fn new(store: PersistentStore) -> Result<Self> {
        Ok(Self {
            store,
            migrator: create_persona_migrator()?,
        })
    }
}

impl StoreRepository for StorePersonaRepository {
    const STORAGE_KEY: &'static str = keys::CUSTOM_PERSONAS;
    const ENTITY_NAME: &'static str = "persona";

    fn store(&self) -> &PersistentStore {
        &self.store
    }

    fn migrator(&self) -> &Migrator {
        &self.migrator
    }
}

#[async_trait]
impl PersonaRepository for StorePersonaRepository {
    async fn get_all(&self) -> Result<Vec<Persona>> {
        let personas: Vec<Persona> = load_records(self.store(), Self::STORAGE_KEY, |record| {
            self.migrator().load_flat_from(Self::ENTITY_NAME, record)
        })
        .await
        .unwrap_or_default();
        Ok(personas)
    }

    async fn save_all(&self, personas: &[Persona]) -> Result<()> {
        // Convert Persona domain models to latest DTO version
        let persona_dtos: Vec<PersonaV2_0_0> = personas.iter().map(|p| p.into()).collect();

        // Use migrator to serialize with version field
        let json_str = self
            .migrator()
            .save_vec_flat(persona_dtos)
            .map_err(|e| CoreError::migration(format!("Failed to serialize personas: {}", e)))?;
        self.store()
            .write_raw(Self::STORAGE_KEY, &json_str)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use serde_json::json;
    use zara_core::persona::{PersonaKind, PersonaSource};

    use super::*;
    use crate::storage::{MemoryBackend, StorageBackend};

    fn persona(id: &str) -> Persona {
        Persona {
            id: id.into(),
            name: format!("Persona {}", id),
            icon: None,
            description: "desc".into(),
            system_prompt: "prompt".into(),
            example_prompt: None,
            kind: PersonaKind::Text,
            source: PersonaSource::Custom,
            created_at: Some(Utc::now()),
        }
    }

    #[tokio::test]
    async fn test_empty_store() {
        let repo = StorePersonaRepository::new(PersistentStore::in_memory()).unwrap();
        assert!(repo.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_and_load_preserves_order() {
        let repo = StorePersonaRepository::new(PersistentStore::in_memory()).unwrap();
        let personas = vec![persona("b"), persona("a")];
        repo.save_all(&personas).await.unwrap();
        assert_eq!(repo.get_all().await.unwrap(), personas);
    }

    #[tokio::test]
    async fn test_loads_unversioned_legacy_records() {
        let backend = Arc::new(MemoryBackend::new());
        let legacy = json!([
            { "id": "x1", "name": "Old painter", "type": "IMAGE", "description": "",
              "systemPrompt": "oil", "isDefault": false, "created_at": "2024-01-01T00:00:00.000Z" },
            { "id": "x2", "name": "Old chat", "type": "TEXT", "description": "",
              "systemPrompt": "hi", "engine": "pollinations" }
        ]);
        backend
            .set(keys::CUSTOM_PERSONAS, &legacy.to_string())
            .await
            .unwrap();
        let repo = StorePersonaRepository::new(PersistentStore::new(backend)).unwrap();

        let loaded = repo.get_all().await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].model(), Some("flux"));
        assert_eq!(loaded[1].kind, PersonaKind::Text);
    }

    #[tokio::test]
    async fn test_save_failure_surfaces_storage_error() {
        let store = PersistentStore::new(Arc::new(MemoryBackend::with_quota(8)));
        let repo = StorePersonaRepository::new(store).unwrap();
        let err = repo.save_all(&[persona("a")]).await.unwrap_err();
        assert!(matches!(err, CoreError::Storage(_)));
    }
}
