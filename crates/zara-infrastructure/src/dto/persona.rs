//! Persona DTOs and migrations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use version_migrate::{IntoDomain, MigratesTo, Versioned};

use zara_core::error::{CoreError, Result};
use zara_core::persona::{DEFAULT_IMAGE_MODEL, Persona, PersonaKind, PersonaSource};

/// Persona V1.0.0, the loose shape written before records were versioned.
#[derive(Debug, Clone, Serialize, Deserialize, Versioned)]
#[versioned(version = "1.0.0")]
#[serde(rename_all = "camelCase")]
pub struct PersonaV1_0_0 {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// `"TEXT"` or `"IMAGE"`.
    #[serde(rename = "type")]
    pub persona_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub system_prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Text engine selector, no longer used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
    #[serde(
        rename = "created_at",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<String>,
}

/// Persona kind as stored in V2.0.0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PersonaKindDTO {
    Text,
    Image { model: String },
}

/// Persona V2.0.0 with a tagged `kind`.
#[derive(Debug, Clone, Serialize, Deserialize, Versioned)]
#[versioned(version = "2.0.0")]
#[serde(rename_all = "camelCase")]
pub struct PersonaV2_0_0 {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub system_prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_prompt: Option<String>,
    pub kind: PersonaKindDTO,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Migration implementations
// ============================================================================

/// Generates a deterministic UUID from a persona name.
fn generate_uuid_from_name(name: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string()
}

/// Migration from PersonaV1_0_0 to PersonaV2_0_0.
impl MigratesTo<PersonaV2_0_0> for PersonaV1_0_0 {
    fn migrate(self) -> PersonaV2_0_0 {
        let kind = if self.persona_type.eq_ignore_ascii_case("IMAGE") {
            PersonaKindDTO::Image {
                model: self
                    .model
                    .filter(|model| !model.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
            }
        } else {
            PersonaKindDTO::Text
        };

        let id = if self.id.trim().is_empty() {
            generate_uuid_from_name(&self.name)
        } else {
            self.id
        };

        let created_at = self
            .created_at
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|date| date.with_timezone(&Utc));

        PersonaV2_0_0 {
            id,
            name: self.name,
            icon: self.icon,
            description: self.description,
            system_prompt: self.system_prompt,
            example_prompt: self.example_prompt,
            kind,
            created_at,
        }
    }
}

// ============================================================================
// Domain model conversions
// ============================================================================

impl From<PersonaKindDTO> for PersonaKind {
    fn from(dto: PersonaKindDTO) -> Self {
        match dto {
            PersonaKindDTO::Text => PersonaKind::Text,
            PersonaKindDTO::Image { model } => PersonaKind::Image { model },
        }
    }
}

impl From<&PersonaKind> for PersonaKindDTO {
    fn from(kind: &PersonaKind) -> Self {
        match kind {
            PersonaKind::Text => PersonaKindDTO::Text,
            PersonaKind::Image { model } => PersonaKindDTO::Image {
                model: model.clone(),
            },
        }
    }
}

/// Stored personas are always custom.
impl IntoDomain<Persona> for PersonaV2_0_0 {
    fn into_domain(self) -> Persona {
        Persona {
            id: self.id,
            name: self.name,
            icon: self.icon,
            description: self.description,
            system_prompt: self.system_prompt,
            example_prompt: self.example_prompt,
            kind: self.kind.into(),
            source: PersonaSource::Custom,
            created_at: self.created_at,
        }
    }
}

/// Convert domain model to PersonaV2_0_0 DTO for persistence.
impl From<&Persona> for PersonaV2_0_0 {
    fn from(persona: &Persona) -> Self {
        PersonaV2_0_0 {
            id: persona.id.clone(),
            name: persona.name.clone(),
            icon: persona.icon.clone(),
            description: persona.description.clone(),
            system_prompt: persona.system_prompt.clone(),
            example_prompt: persona.example_prompt.clone(),
            kind: (&persona.kind).into(),
            created_at: persona.created_at,
        }
    }
}

// ============================================================================
// Migrator factory
// ============================================================================

/// Creates a Migrator for Persona entities.
///
/// # Migration Path
///
/// - V1.0.0 → V2.0.0: `type`/`model` folded into a tagged `kind`
/// - V2.0.0 → Persona: Converts DTO to domain model
pub fn create_persona_migrator() -> Result<version_migrate::Migrator> {
    version_migrate::migrator!("persona" => [PersonaV1_0_0, PersonaV2_0_0, Persona])
        .map_err(|e| CoreError::migration(format!("Failed to create persona migrator: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_legacy_image_persona_defaults_model() {
        let migrator = create_persona_migrator().unwrap();
        let persona: Persona = migrator
            .load_flat_from(
                "persona",
                json!({
                    "version": "1.0.0",
                    "id": "p1",
                    "name": "Painter",
                    "type": "IMAGE",
                    "description": "paints",
                    "systemPrompt": "oil on canvas",
                    "isDefault": false,
                    "created_at": "2024-06-01T10:00:00.000Z"
                }),
            )
            .unwrap();

        assert_eq!(persona.id, "p1");
        assert_eq!(persona.kind, PersonaKind::image("flux"));
        assert_eq!(persona.source, PersonaSource::Custom);
        assert!(persona.created_at.is_some());
    }

    #[test]
    fn test_legacy_text_persona_drops_engine() {
        let migrator = create_persona_migrator().unwrap();
        let persona: Persona = migrator
            .load_flat_from(
                "persona",
                json!({
                    "version": "1.0.0",
                    "id": "",
                    "name": "Chatty",
                    "type": "TEXT",
                    "systemPrompt": "talk",
                    "engine": "pollinations",
                    "created_at": "not a date"
                }),
            )
            .unwrap();

        assert_eq!(persona.kind, PersonaKind::Text);
        assert_eq!(persona.id, generate_uuid_from_name("Chatty"));
        assert_eq!(persona.created_at, None);
    }

    #[test]
    fn test_v2_round_trip_through_migrator() {
        let migrator = create_persona_migrator().unwrap();
        let persona = Persona {
            id: "p2".into(),
            name: "Sketch".into(),
            icon: Some("✏️".into()),
            description: String::new(),
            system_prompt: "pencil".into(),
            example_prompt: Some("a fox".into()),
            kind: PersonaKind::image("turbo"),
            source: PersonaSource::Custom,
            created_at: Some(Utc::now()),
        };

        let json_str = migrator
            .save_vec_flat(vec![PersonaV2_0_0::from(&persona)])
            .unwrap();
        let values: Vec<serde_json::Value> = serde_json::from_str(&json_str).unwrap();
        assert_eq!(values[0]["version"], json!("2.0.0"));
        assert_eq!(values[0]["kind"], json!({"type": "IMAGE", "model": "turbo"}));

        let loaded: Vec<Persona> = migrator.load_vec_flat_from("persona", values).unwrap();
        assert_eq!(loaded, vec![persona]);
    }
}
