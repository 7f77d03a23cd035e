//! Pure Apify REST API client.
//!
//! A minimal client for the Apify platform storage API. Supports reading and
//! writing key-value store records, pushing dataset items, and building
//! Apify proxy URLs.
//!
//! # Example
//!
//! ```rust,ignore
//! use apify_client::ApifyClient;
//!
//! let client = ApifyClient::new("your-api-token".into());
//!
//! client.set_record("store-id", "STATE", &serde_json::json!({ "saved": 0 })).await?;
//! let state: Option<serde_json::Value> = client.get_record("store-id", "STATE").await?;
//! client.push_items("dataset-id", &serde_json::json!({ "title": "Rust developer" })).await?;
//! ```

pub mod error;
pub mod types;

pub use error::{ApifyError, Result};
pub use types::ProxyConfiguration;

use serde::de::DeserializeOwned;
use serde::Serialize;

const BASE_URL: &str = "https://api.apify.com/v2";

pub struct ApifyClient {
    client: reqwest::Client,
    token: String,
}

impl ApifyClient {
    pub fn new(token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
        }
    }

    /// Read a key-value store record. Returns `None` when the key does not exist.
    pub async fn get_record<T: DeserializeOwned>(
        &self,
        store_id: &str,
        key: &str,
    ) -> Result<Option<T>> {
        let url = format!(
            "{}/key-value-stores/{}/records/{}",
            BASE_URL, store_id, key
        );
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApifyError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let bytes = resp.bytes().await?;
        if bytes.is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Replace a key-value store record with a JSON value.
    ///
    /// The platform swaps the record in a single write, so readers see either
    /// the previous or the new value.
    pub async fn set_record<T: Serialize + ?Sized>(
        &self,
        store_id: &str,
        key: &str,
        value: &T,
    ) -> Result<()> {
        let url = format!(
            "{}/key-value-stores/{}/records/{}",
            BASE_URL, store_id, key
        );
        let resp = self
            .client
            .put(&url)
            .bearer_auth(&self.token)
            .json(value)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApifyError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        tracing::debug!(store_id, key, "Stored key-value record");
        Ok(())
    }

    /// Append one item (or a JSON array of items) to a dataset.
    pub async fn push_items<T: Serialize + ?Sized>(
        &self,
        dataset_id: &str,
        items: &T,
    ) -> Result<()> {
        let url = format!("{}/datasets/{}/items", BASE_URL, dataset_id);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(items)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApifyError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(())
    }
}
