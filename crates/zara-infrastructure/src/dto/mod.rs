//! Data Transfer Objects (DTOs) for persistence.
//!
//! These DTOs represent the versioned schema for persisting data.
//! They are private to the infrastructure layer and handle the evolution
//! of the storage format over time. Records are stored flat, with the
//! schema version inline as `"version": "x.y.z"`.
//!
//! ## Schema Versioning (Semantic Versioning)
//!
//! - **MAJOR (X.0.0)**: Breaking changes (field removal, type changes)
//! - **MINOR (1.X.0)**: Backward-compatible additions (new optional fields)
//!
//! ### Persona Version History
//! - **1.0.0**: Loose shape written before versioning (`type`, optional
//!   `model`, `engine`, `isDefault`)
//! - **2.0.0**: Tagged `kind`
//!
//! ### Announcement Version History
//! - **1.0.0**: Plain announcement
//! - **1.1.0**: Added `likes` and threaded `comments`

mod announcement;
mod persona;

pub use announcement::{
    AnnouncementV1_0_0, AnnouncementV1_1_0, CommentDTO, create_announcement_migrator,
};
pub use persona::{PersonaKindDTO, PersonaV1_0_0, PersonaV2_0_0, create_persona_migrator};
