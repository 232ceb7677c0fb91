pub mod config_service;
pub mod dto;
pub mod paths;
pub mod storage;
pub mod store_announcement_repository;
pub mod store_persona_repository;
pub mod store_repository;
pub mod store_state_repository;
pub mod versioned;

pub use crate::config_service::ConfigService;
pub use crate::paths::HubPaths;
pub use crate::storage::{FileBackend, MemoryBackend, PersistentStore, StorageBackend, StorageError};
pub use crate::store_announcement_repository::StoreAnnouncementRepository;
pub use crate::store_persona_repository::StorePersonaRepository;
pub use crate::store_state_repository::StoreStateRepository;
