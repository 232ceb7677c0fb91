//! Persona domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Image model used when none is given.
pub const DEFAULT_IMAGE_MODEL: &str = "flux";

/// What a persona produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PersonaKind {
    /// Chat persona; text models take no model selection.
    Text,
    Image { model: String },
}

impl PersonaKind {
    pub fn image(model: impl Into<String>) -> Self {
        PersonaKind::Image {
            model: model.into(),
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, PersonaKind::Image { .. })
    }
}

/// Where a persona comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PersonaSource {
    /// Shipped with the app, immutable and never persisted.
    BuiltIn,
    /// Created or imported by the user.
    Custom,
}

/// A reusable generation preset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    pub id: String,
    pub name: String,
    pub icon: Option<String>,
    pub description: String,
    pub system_prompt: String,
    pub example_prompt: Option<String>,
    pub kind: PersonaKind,
    pub source: PersonaSource,
    pub created_at: Option<DateTime<Utc>>,
}

/// Checks the fields every editable persona needs.
pub(crate) fn validate_fields(
    name: &str,
    system_prompt: &str,
    kind: &PersonaKind,
) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Name is required and cannot be empty".to_string());
    }
    if system_prompt.trim().is_empty() {
        return Err("System prompt is required and cannot be empty".to_string());
    }
    if let PersonaKind::Image { model } = kind {
        if model.trim().is_empty() {
            return Err("Image personas need a model".to_string());
        }
    }
    Ok(())
}

impl Persona {
    /// Rejects edits that would leave the persona unusable.
    pub fn validate(&self) -> Result<(), String> {
        validate_fields(&self.name, &self.system_prompt, &self.kind)
    }

    pub fn is_default(&self) -> bool {
        self.source == PersonaSource::BuiltIn
    }

    /// Image model, if this is an image persona.
    pub fn model(&self) -> Option<&str> {
        match &self.kind {
            PersonaKind::Image { model } => Some(model.as_str()),
            PersonaKind::Text => None,
        }
    }
}
