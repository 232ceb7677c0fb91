//! JSON persistence over a [`StorageBackend`].

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, warn};

use super::backend::{MemoryBackend, StorageBackend};
use super::error::StorageError;
use super::keys::corrupt_key;

/// Typed reads and writes of JSON values.
///
/// Reads never fail: a missing or unreadable value yields the caller's
/// default. Unparseable raw values are copied to `<key>.corrupt` first.
#[derive(Clone)]
pub struct PersistentStore {
    backend: Arc<dyn StorageBackend>,
}

impl PersistentStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    async fn raw(&self, key: &str) -> Option<String> {
        match self.backend.get(key).await {
            Ok(raw) => raw,
            Err(err) => {
                warn!(key, error = %err, "Failed to read from storage");
                None
            }
        }
    }

    /// Parsed JSON at `key`, or `None` when missing or corrupt.
    ///
    /// Nesting depth is not limited; comment threads can be arbitrarily deep.
    pub async fn read_value(&self, key: &str) -> Option<Value> {
        let raw = self.raw(key).await?;
        match parse_unbounded(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                error!(key, error = %err, "Stored value is not valid JSON");
                self.quarantine(key, &raw).await;
                None
            }
        }
    }

    /// Value at `key`, or `default` when missing or unreadable.
    pub async fn read<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let Some(raw) = self.raw(key).await else {
            debug!(key, "No stored value, using default");
            return default;
        };
        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                error!(key, error = %err, "Stored value has an unexpected shape, using default");
                self.quarantine(key, &raw).await;
                default
            }
        }
    }

    pub async fn write<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), StorageError> {
        let serialized = serde_json::to_string(value).map_err(|source| StorageError::Serialize {
            key: key.to_string(),
            source,
        })?;
        self.write_raw(key, &serialized).await
    }

    /// Stores text that is already serialized JSON.
    pub async fn write_raw(&self, key: &str, json: &str) -> Result<(), StorageError> {
        self.backend.set(key, json).await.inspect_err(|err| {
            warn!(key, error = %err, "Failed to write to storage");
        })
    }

    pub async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.backend.remove(key).await
    }

    /// Copies an unreadable raw value to `<key>.corrupt`.
    pub async fn quarantine(&self, key: &str, raw: &str) {
        let target = corrupt_key(key);
        match self.backend.set(&target, raw).await {
            Ok(()) => warn!(key, target = %target, "Quarantined unreadable value"),
            Err(err) => error!(key, error = %err, "Failed to quarantine unreadable value"),
        }
    }
}

fn parse_unbounded(raw: &str) -> serde_json::Result<Value> {
    let mut json = serde_json::Deserializer::from_str(raw);
    json.disable_recursion_limit();
    let value = Value::deserialize(serde_stacker::Deserializer::new(&mut json))?;
    json.end()?;
    Ok(value)
}
