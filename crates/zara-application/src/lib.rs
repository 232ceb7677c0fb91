//! Application layer for the Zara hub.
//!
//! Wires the domain services to the store and exposes them through
//! [`CoreFacade`], the single entry point for UI code.

pub mod announcement_board;
pub mod facade;
pub mod logging;
pub mod persona_catalog;

#[cfg(test)]
mod testing;

pub use announcement_board::AnnouncementBoard;
pub use facade::CoreFacade;
pub use logging::init_tracing;
pub use persona_catalog::PersonaCatalog;
