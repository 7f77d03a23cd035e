//! Storage collaborators.
//!
//! - `KeyValueStore`: opaque blobs under string keys (checkpoint state)
//! - `Dataset`: append-only sink for output records
//!
//! Implementations live in [`crate::stores`].

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::types::OfferRecord;

/// Get/set blob store.
///
/// `set` must replace the value atomically: a reader sees either the old or
/// the new blob, never a partial write.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    async fn set(&self, key: &str, value: &[u8]) -> StoreResult<()>;
}

/// Write-only output dataset.
#[async_trait]
pub trait Dataset: Send + Sync {
    async fn push(&self, record: &OfferRecord) -> StoreResult<()>;
}

#[async_trait]
impl<T: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<T> {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        (**self).set(key, value).await
    }
}

#[async_trait]
impl<T: Dataset + ?Sized> Dataset for std::sync::Arc<T> {
    async fn push(&self, record: &OfferRecord) -> StoreResult<()> {
        (**self).push(record).await
    }
}

#[async_trait]
impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        (**self).set(key, value).await
    }
}

#[async_trait]
impl<T: Dataset + ?Sized> Dataset for &T {
    async fn push(&self, record: &OfferRecord) -> StoreResult<()> {
        (**self).push(record).await
    }
}
