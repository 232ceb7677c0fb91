//! Domain layer of the Zara hub: identity, roles, credits, personas and the
//! announcement feed, plus the collaborator traits the outer layers implement.

pub mod announcement;
pub mod auth;
pub mod clock;
pub mod config;
pub mod credit;
pub mod error;
pub mod generation;
pub mod persona;
pub mod state;

// Re-export common error types
pub use error::{AuthError, CoreError, Result};
