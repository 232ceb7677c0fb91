//! Persona repository trait.

use super::model::Persona;
use crate::error::Result;

/// Persistence for custom personas. Built-in personas are never stored.
#[async_trait::async_trait]
pub trait PersonaRepository: Send + Sync {
    /// Retrieves all stored custom personas, most recent first.
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<Persona>)`: All stored personas
    /// - `Err(CoreError)`: Error if retrieval fails
    async fn get_all(&self) -> Result<Vec<Persona>>;

    /// Saves all custom personas, replacing the stored list.
    async fn save_all(&self, personas: &[Persona]) -> Result<()>;
}
