//! Persona creation requests and import parsing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::model::{DEFAULT_IMAGE_MODEL, Persona, PersonaKind, PersonaSource, validate_fields};
use crate::error::{CoreError, Result};

/// Request to create a new custom persona.
///
/// Used by both the editor form and the JSON import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePersonaRequest {
    /// Display name (required)
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub system_prompt: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub example_prompt: Option<String>,

    pub kind: PersonaKind,
}

impl CreatePersonaRequest {
    /// Validate the request and return errors if any.
    pub fn validate(&self) -> std::result::Result<(), String> {
        validate_fields(&self.name, &self.system_prompt, &self.kind)
    }

    /// Builds a custom persona with a fresh id.
    pub fn into_persona(self, now: DateTime<Utc>) -> Persona {
        Persona {
            id: Uuid::new_v4().to_string(),
            name: self.name.trim().to_string(),
            icon: self.icon,
            description: self.description,
            system_prompt: self.system_prompt,
            example_prompt: self.example_prompt,
            kind: self.kind,
            source: PersonaSource::Custom,
            created_at: Some(now),
        }
    }
}

/// Parses an exported persona list.
///
/// Every entry must carry `name`, `systemPrompt` and `type` (`TEXT` or
/// `IMAGE`). One bad entry rejects the whole batch. Image entries without a
/// `model` get the default image model; text entries drop any model.
pub fn parse_import_batch(raw: &Value) -> Result<Vec<CreatePersonaRequest>> {
    let entries = raw.as_array().ok_or_else(|| {
        CoreError::import_validation("expected a JSON array of personas")
    })?;

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| parse_entry(index, entry))
        .collect()
}

fn parse_entry(index: usize, entry: &Value) -> Result<CreatePersonaRequest> {
    let object = entry.as_object().ok_or_else(|| {
        CoreError::import_validation(format!("entry {}: expected an object", index))
    })?;

    let name = required_str(object, index, "name")?;
    if name.trim().is_empty() {
        return Err(CoreError::import_validation(format!(
            "entry {}: field 'name' must not be empty",
            index
        )));
    }
    let system_prompt = required_str(object, index, "systemPrompt")?;
    let kind = match required_str(object, index, "type")?.to_ascii_uppercase().as_str() {
        "TEXT" => PersonaKind::Text,
        "IMAGE" => PersonaKind::image(
            optional_str(object, "model")
                .filter(|model| !model.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
        ),
        other => {
            return Err(CoreError::import_validation(format!(
                "entry {}: field 'type' must be TEXT or IMAGE, got '{}'",
                index, other
            )));
        }
    };

    Ok(CreatePersonaRequest {
        name: name.trim().to_string(),
        icon: optional_str(object, "icon"),
        description: optional_str(object, "description").unwrap_or_default(),
        system_prompt,
        example_prompt: optional_str(object, "examplePrompt"),
        kind,
    })
}

fn required_str(object: &Map<String, Value>, index: usize, field: &str) -> Result<String> {
    match object.get(field) {
        Some(Value::String(value)) => Ok(value.clone()),
        Some(_) => Err(CoreError::import_validation(format!(
            "entry {}: field '{}' must be a string",
            index, field
        ))),
        None => Err(CoreError::import_validation(format!(
            "entry {}: missing field '{}'",
            index, field
        ))),
    }
}

fn optional_str(object: &Map<String, Value>, field: &str) -> Option<String> {
    object
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
}
