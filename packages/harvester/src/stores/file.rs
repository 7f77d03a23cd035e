//! Local directory storage in the Apify local-storage layout.
//!
//! ```text
//! <root>/key_value_stores/default/<KEY>.json
//! <root>/datasets/default/000000001.json
//! ```

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::StoreResult;
use crate::traits::store::{Dataset, KeyValueStore};
use crate::types::OfferRecord;

pub struct FileStore {
    kv_dir: PathBuf,
    dataset_dir: PathBuf,
    next_item: Mutex<u64>,
}

impl FileStore {
    /// Open (creating if needed) a storage directory.
    ///
    /// Dataset numbering continues after the highest existing item, so a
    /// resumed run appends instead of overwriting.
    pub async fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref();
        let kv_dir = root.join("key_value_stores").join("default");
        let dataset_dir = root.join("datasets").join("default");
        tokio::fs::create_dir_all(&kv_dir).await?;
        tokio::fs::create_dir_all(&dataset_dir).await?;

        let mut last = 0u64;
        let mut entries = tokio::fs::read_dir(&dataset_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(n) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<u64>().ok())
            {
                last = last.max(n);
            }
        }

        debug!(root = %root.display(), existing_items = last, "Opened file store");
        Ok(Self {
            kv_dir,
            dataset_dir,
            next_item: Mutex::new(last + 1),
        })
    }

    pub fn key_path(&self, key: &str) -> PathBuf {
        self.kv_dir.join(format!("{}.json", key))
    }

    pub fn dataset_dir(&self) -> &Path {
        &self.dataset_dir
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        match tokio::fs::read(self.key_path(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write to a sibling temp file, then rename over the target.
    async fn set(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        let target = self.key_path(key);
        let tmp = self.kv_dir.join(format!(".{}.json.tmp", key));
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &target).await?;
        Ok(())
    }
}

#[async_trait]
impl Dataset for FileStore {
    async fn push(&self, record: &OfferRecord) -> StoreResult<()> {
        let body = serde_json::to_vec_pretty(record)?;
        let mut next = self.next_item.lock().await;
        let name = format!("{:09}.json", *next);
        let tmp = self.dataset_dir.join(format!(".{}.tmp", name));
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, self.dataset_dir.join(name)).await?;
        *next += 1;
        Ok(())
    }
}
