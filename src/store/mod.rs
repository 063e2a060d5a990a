//! Blob store capability the counter is persisted through.

mod file;
mod memory;
mod redis_store;

pub use self::file::FileBlobStore;
pub use self::memory::MemoryBlobStore;
pub use self::redis_store::RedisBlobStore;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{Config, StoreBackend};
use crate::error::StoreError;

/// Minimal key-value blob storage. `put` always overwrites the whole value.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Returns `Ok(None)` when nothing is stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError>;
}

/// Opens the backend selected in `config`.
pub async fn from_config(config: &Config) -> Result<Arc<dyn BlobStore>, StoreError> {
    let store: Arc<dyn BlobStore> = match config.store_backend {
        StoreBackend::Memory => Arc::new(MemoryBlobStore::new()),
        StoreBackend::File => Arc::new(FileBlobStore::new(&config.store_location)),
        StoreBackend::Redis => {
            let store = RedisBlobStore::connect(&config.redis_url, &config.store_location).await?;
            store.ping().await?;
            Arc::new(store)
        }
    };

    tracing::info!(
        backend = ?config.store_backend,
        location = %config.store_location,
        "Blob store ready"
    );
    Ok(store)
}
