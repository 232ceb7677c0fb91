//! Storage layer: raw backends and typed JSON persistence.

mod backend;
mod error;
mod file_backend;
pub mod keys;
mod persistent_store;

pub use backend::{MemoryBackend, StorageBackend};
pub use error::StorageError;
pub use file_backend::FileBackend;
pub use persistent_store::PersistentStore;
