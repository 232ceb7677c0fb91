//! Persona domain module.
//!
//! # Module Structure
//!
//! - `model`: persona domain model (`Persona`, `PersonaKind`, `PersonaSource`)
//! - `repository`: repository trait for custom persona persistence
//! - `preset`: built-in personas
//! - `request`: create requests and import batch parsing

mod model;
mod preset;
mod repository;
pub mod request;

// Re-export public API
pub use model::{DEFAULT_IMAGE_MODEL, Persona, PersonaKind, PersonaSource};
pub use preset::get_default_presets;
pub use repository::PersonaRepository;
pub use request::{CreatePersonaRequest, parse_import_batch};
