use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

use super::BlobStore;
use crate::error::StoreError;

/// One file per key beneath a root directory.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    root: PathBuf,
}

impl FileBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let relative = Path::new(key);
        let escapes_root = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if key.is_empty() || escapes_root {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BlobStore for FileBlobStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.path_for(key)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write then rename so readers never see a partial record.
        let tmp = path.with_extension(format!("{}.tmp", uuid::Uuid::new_v4().simple()));
        let written = match fs::write(&tmp, &value).await {
            Ok(()) => fs::rename(&tmp, &path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        tracing::debug!(path = %path.display(), bytes = value.len(), "Blob written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (PathBuf, FileBlobStore) {
        let root = std::env::temp_dir().join(format!("visit-counter-{}", uuid::Uuid::new_v4()));
        (root.clone(), FileBlobStore::new(root))
    }

    #[tokio::test]
    async fn test_missing_file_is_none() {
        let (_, store) = temp_store();
        assert_eq!(store.get("visits/x/2026-01.json").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_creates_directories_and_overwrites() {
        let (root, store) = temp_store();
        let key = "visits/https%3A%2F%2Fa.com/2026-01.json";

        store.put(key, b"{\"v\":1}".to_vec()).await.unwrap();
        store.put(key, b"{\"v\":2}".to_vec()).await.unwrap();

        assert_eq!(store.get(key).await.unwrap(), Some(b"{\"v\":2}".to_vec()));

        let entries = std::fs::read_dir(root.join("visits/https%3A%2F%2Fa.com"))
            .unwrap()
            .count();
        assert_eq!(entries, 1, "temporary files must not be left behind");

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_failed_put_leaves_no_temporary_file() {
        let (root, store) = temp_store();
        // A non-empty directory where the record should go makes the rename fail.
        let blocked = root.join("visits/origin/2026-01.json");
        std::fs::create_dir_all(blocked.join("occupied")).unwrap();

        let result = store.put("visits/origin/2026-01.json", b"{}".to_vec()).await;
        assert!(matches!(result, Err(StoreError::Io(_))));

        let leftovers: Vec<_> = std::fs::read_dir(root.join("visits/origin"))
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_rejects_keys_escaping_root() {
        let (_, store) = temp_store();
        assert!(matches!(
            store.get("../etc/passwd").await,
            Err(StoreError::InvalidKey(_))
        ));
        assert!(matches!(
            store.put("/abs/path", Vec::new()).await,
            Err(StoreError::InvalidKey(_))
        ));
    }
}
