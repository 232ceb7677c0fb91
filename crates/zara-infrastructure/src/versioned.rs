//! Loading arrays of flat versioned records.
//!
//! Records written before versioning carry no `version` field; they are
//! treated as `1.0.0`. A record that fails to migrate is skipped and the raw
//! array is quarantined, so the readable records stay usable and nothing is
//! lost.

use std::fmt::Display;

use serde_json::Value;
use tracing::{error, warn};

use crate::storage::PersistentStore;

pub const VERSION_KEY: &str = "version";
pub const LEGACY_VERSION: &str = "1.0.0";

/// Adds `"version": "1.0.0"` to an object that has no version.
pub fn stamp_legacy(mut record: Value) -> Value {
    if let Value::Object(fields) = &mut record {
        fields
            .entry(VERSION_KEY)
            .or_insert_with(|| Value::String(LEGACY_VERSION.to_string()));
    }
    record
}

/// Loads the array stored at `key`, migrating each record with `load`.
///
/// Returns `None` when nothing is stored (or the stored value is unreadable
/// JSON), so callers can seed defaults.
pub async fn load_records<T, E, F>(store: &PersistentStore, key: &str, mut load: F) -> Option<Vec<T>>
where
    E: Display,
    F: FnMut(Value) -> Result<T, E>,
{
    let value = store.read_value(key).await?;
    let Value::Array(records) = &value else {
        error!(key, "Stored value is not an array");
        store.quarantine(key, &value.to_string()).await;
        return Some(Vec::new());
    };

    let mut loaded = Vec::with_capacity(records.len());
    let mut failures = 0usize;
    for (index, record) in records.iter().enumerate() {
        match load(stamp_legacy(record.clone())) {
            Ok(item) => loaded.push(item),
            Err(err) => {
                failures += 1;
                error!(key, index, error = %err, "Failed to migrate stored record, skipping");
            }
        }
    }

    if failures > 0 {
        warn!(key, failures, kept = loaded.len(), "Some stored records were unreadable");
        store.quarantine(key, &value.to_string()).await;
    }
    Some(loaded)
}
