//! Small global settings persisted outside the versioned slices.

mod repository;

pub use repository::StateRepository;
