//! Apify platform storage via the REST API.

use apify_client::ApifyClient;
use async_trait::async_trait;

use crate::error::StoreResult;
use crate::traits::store::{Dataset, KeyValueStore};
use crate::types::OfferRecord;

/// The run's default key-value store and dataset on the Apify platform.
pub struct ApifyStore {
    client: ApifyClient,
    store_id: String,
    dataset_id: String,
}

impl ApifyStore {
    pub fn new(client: ApifyClient, store_id: impl Into<String>, dataset_id: impl Into<String>) -> Self {
        Self {
            client,
            store_id: store_id.into(),
            dataset_id: dataset_id.into(),
        }
    }
}

#[async_trait]
impl KeyValueStore for ApifyStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let value: Option<serde_json::Value> = self.client.get_record(&self.store_id, key).await?;
        Ok(value.map(|v| serde_json::to_vec(&v)).transpose()?)
    }

    async fn set(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        let value: serde_json::Value = serde_json::from_slice(value)?;
        self.client.set_record(&self.store_id, key, &value).await?;
        Ok(())
    }
}

#[async_trait]
impl Dataset for ApifyStore {
    async fn push(&self, record: &OfferRecord) -> StoreResult<()> {
        self.client.push_items(&self.dataset_id, record).await?;
        Ok(())
    }
}
