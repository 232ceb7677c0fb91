use version_migrate::Migrator;

use crate::storage::PersistentStore;

/// Common trait for repositories that keep a versioned record array under
/// one storage key.
pub trait StoreRepository {
    /// The storage key holding the record array
    const STORAGE_KEY: &'static str;

    /// The entity name registered with the migrator
    const ENTITY_NAME: &'static str;

    /// Returns a reference to the underlying store
    fn store(&self) -> &PersistentStore;

    fn migrator(&self) -> &Migrator;
}
