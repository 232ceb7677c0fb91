//! Directory-backed storage with atomic writes.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

use super::backend::{StorageBackend, validate_key};
use super::error::StorageError;

/// Stores each key in `<root>/<key>.json`.
///
/// Provides:
/// - **Atomicity**: writes go to a temporary file that is renamed over the
///   target, so readers see either the old or the new value
/// - **Durability**: explicit fsync before rename
///
/// Does NOT parse or validate values.
#[derive(Debug, Clone)]
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    /// Creates a backend rooted at `root`. The directory is created on the
    /// first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn value_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", key))
    }

    fn temp_path(&self, key: &str) -> PathBuf {
        self.root.join(format!(".{}.json.tmp", key))
    }
}

#[async_trait]
impl StorageBackend for FileBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        validate_key(key)?;
        match fs::read_to_string(self.value_path(key)).await {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        fs::create_dir_all(&self.root).await?;

        // Write to temporary file in the same directory
        let tmp_path = self.temp_path(key);
        let mut tmp_file = File::create(&tmp_path).await?;
        tmp_file.write_all(value.as_bytes()).await?;

        // Ensure data is written to disk
        tmp_file.sync_all().await?;
        drop(tmp_file);

        // Atomic rename
        fs::rename(&tmp_path, self.value_path(key)).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        match fs::remove_file(self.value_path(key)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_set_get_remove() {
        let temp_dir = TempDir::new().unwrap();
        let backend = FileBackend::new(temp_dir.path().join("store"));

        assert_eq!(backend.get("custom-personas").await.unwrap(), None);
        backend.set("custom-personas", "[1,2]").await.unwrap();
        backend.set("custom-personas", "[3]").await.unwrap();
        assert_eq!(
            backend.get("custom-personas").await.unwrap().as_deref(),
            Some("[3]")
        );
        assert!(temp_dir.path().join("store/custom-personas.json").exists());
        assert!(!temp_dir.path().join("store/.custom-personas.json.tmp").exists());

        backend.remove("custom-personas").await.unwrap();
        backend.remove("custom-personas").await.unwrap();
        assert_eq!(backend.get("custom-personas").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_rejects_path_like_keys() {
        let temp_dir = TempDir::new().unwrap();
        let backend = FileBackend::new(temp_dir.path());
        assert!(matches!(
            backend.set("../outside", "x").await,
            Err(StorageError::InvalidKey(_))
        ));
    }
}
