//! Persona catalog: built-in personas merged with the user's custom ones.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use zara_core::clock::Clock;
use zara_core::error::{CoreError, Result};
use zara_core::persona::{
    CreatePersonaRequest, Persona, PersonaRepository, PersonaSource, get_default_presets,
    parse_import_batch,
};

/// Owns the in-memory custom persona list.
///
/// Every mutation builds the next list, persists it, and only then replaces
/// the in-memory copy, so a failed save leaves memory and storage in
/// agreement.
pub struct PersonaCatalog {
    repository: Arc<dyn PersonaRepository>,
    clock: Arc<dyn Clock>,
    defaults: Vec<Persona>,
    custom: RwLock<Vec<Persona>>,
}

impl PersonaCatalog {
    pub fn new(repository: Arc<dyn PersonaRepository>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repository,
            clock,
            defaults: get_default_presets(),
            custom: RwLock::new(Vec::new()),
        }
    }

    fn is_built_in(&self, id: &str) -> bool {
        self.defaults.iter().any(|persona| persona.id == id)
    }

    /// Loads custom personas from storage. Unreadable storage yields an
    /// empty list.
    pub async fn load(&self) -> usize {
        let stored = match self.repository.get_all().await {
            Ok(stored) => stored,
            Err(err) => {
                warn!(error = %err, "Failed to load custom personas, starting empty");
                Vec::new()
            }
        };

        let mut seen = HashSet::new();
        let custom: Vec<Persona> = stored
            .into_iter()
            .filter(|persona| {
                let keep = !self.is_built_in(&persona.id) && seen.insert(persona.id.clone());
                if !keep {
                    warn!(id = %persona.id, "Dropping stored persona with a duplicate id");
                }
                keep
            })
            .collect();

        let count = custom.len();
        *self.custom.write().await = custom;
        debug!(count, "Custom personas loaded");
        count
    }

    /// Built-in personas first, then custom ones, most recent first.
    pub async fn list(&self) -> Vec<Persona> {
        let custom = self.custom.read().await;
        self.defaults.iter().chain(custom.iter()).cloned().collect()
    }

    pub async fn custom(&self) -> Vec<Persona> {
        self.custom.read().await.clone()
    }

    pub async fn get_by_id(&self, id: &str) -> Option<Persona> {
        if let Some(persona) = self.defaults.iter().find(|persona| persona.id == id) {
            return Some(persona.clone());
        }
        self.custom
            .read()
            .await
            .iter()
            .find(|persona| persona.id == id)
            .cloned()
    }

    pub async fn create(&self, request: CreatePersonaRequest) -> Result<Persona> {
        request.validate().map_err(CoreError::invalid_input)?;
        let persona = request.into_persona(self.clock.now());

        let mut custom = self.custom.write().await;
        let next: Vec<Persona> = std::iter::once(persona.clone())
            .chain(custom.iter().cloned())
            .collect();
        self.persist(&next).await?;
        *custom = next;

        info!(id = %persona.id, name = %persona.name, "Persona created");
        Ok(persona)
    }

    /// Replaces the custom persona with the same id.
    ///
    /// Returns `false` without touching anything for built-in or unknown ids.
    /// Blank names, system prompts or image models are rejected.
    pub async fn update(&self, persona: Persona) -> Result<bool> {
        if self.is_built_in(&persona.id) {
            debug!(id = %persona.id, "Ignoring update of a built-in persona");
            return Ok(false);
        }
        persona.validate().map_err(CoreError::invalid_input)?;

        let mut custom = self.custom.write().await;
        let Some(index) = custom.iter().position(|p| p.id == persona.id) else {
            debug!(id = %persona.id, "Ignoring update of an unknown persona");
            return Ok(false);
        };

        let mut next = custom.clone();
        next[index] = Persona {
            source: PersonaSource::Custom,
            ..persona
        };
        self.persist(&next).await?;
        *custom = next;

        info!(id = %custom[index].id, "Persona updated");
        Ok(true)
    }

    /// Removes a custom persona. Built-in and unknown ids are a no-op.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        if self.is_built_in(id) {
            debug!(id, "Ignoring delete of a built-in persona");
            return Ok(false);
        }

        let mut custom = self.custom.write().await;
        if !custom.iter().any(|persona| persona.id == id) {
            return Ok(false);
        }
        let next: Vec<Persona> = custom.iter().filter(|p| p.id != id).cloned().collect();
        self.persist(&next).await?;
        *custom = next;

        info!(id, "Persona deleted");
        Ok(true)
    }

    /// Imports an exported persona list, all or nothing.
    ///
    /// Imported personas get fresh ids and are prepended in their given
    /// order.
    pub async fn import(&self, raw: &Value) -> Result<usize> {
        let requests = parse_import_batch(raw)?;
        let now = self.clock.now();
        let imported: Vec<Persona> = requests
            .into_iter()
            .map(|request| request.into_persona(now))
            .collect();
        let count = imported.len();

        let mut custom = self.custom.write().await;
        let next: Vec<Persona> = imported.into_iter().chain(custom.iter().cloned()).collect();
        self.persist(&next).await?;
        *custom = next;

        info!(count, "Personas imported");
        Ok(count)
    }

    async fn persist(&self, next: &[Persona]) -> Result<()> {
        self.repository.save_all(next).await.map_err(|err| {
            warn!(error = %err, "Failed to save custom personas");
            CoreError::save_failed(err.to_string())
        })
    }
}
