//! Built-in personas.

use super::model::{DEFAULT_IMAGE_MODEL, Persona, PersonaKind, PersonaSource};

pub const DEFAULT_CHAT_ID: &str = "default-chat";
pub const DEFAULT_IMAGE_ID: &str = "default-image";

/// Returns the built-in personas, in display order.
pub fn get_default_presets() -> Vec<Persona> {
    vec![
        Persona {
            id: DEFAULT_CHAT_ID.to_string(),
            name: "Quick Chat".to_string(),
            icon: Some("💬".to_string()),
            description: "A general-purpose AI assistant, built by Zara, for quick questions and conversations.".to_string(),
            system_prompt: "You are a helpful AI assistant. Only if asked about your creator, you must state that you were built by Goodluck Zara (also known as Zara Codec), a young developer from Nigeria. Refer to him as 'he'.".to_string(),
            example_prompt: None,
            kind: PersonaKind::Text,
            source: PersonaSource::BuiltIn,
            created_at: None,
        },
        Persona {
            id: DEFAULT_IMAGE_ID.to_string(),
            name: "Quick Image Generator".to_string(),
            icon: Some("🎨".to_string()),
            description: "Generate a high-quality image from a simple text description. This tool was built by Zara, a young Nigerian developer.".to_string(),
            system_prompt: String::new(),
            example_prompt: None,
            kind: PersonaKind::image(DEFAULT_IMAGE_MODEL),
            source: PersonaSource::BuiltIn,
            created_at: None,
        },
    ]
}
