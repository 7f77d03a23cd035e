//! Process settings from the environment, and run input loading.

use dotenvy::dotenv;
use std::env;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{HarvestError, Result};
use crate::traits::store::KeyValueStore;
use crate::types::HarvestInput;

/// Key-value store key holding the run input.
pub const INPUT_KEY: &str = "INPUT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    /// Local directory in the Apify local-storage layout
    Local,
    /// Apify platform key-value store and dataset
    Apify,
}

/// Apify platform credentials and resource ids.
#[derive(Debug, Clone, Default)]
pub struct ApifySettings {
    pub token: Option<String>,
    pub key_value_store_id: Option<String>,
    pub dataset_id: Option<String>,
    pub proxy_password: Option<String>,
}

/// Settings loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Settings {
    pub storage: StorageKind,
    pub storage_dir: PathBuf,
    /// Explicit input file; otherwise the input is read from the store
    pub input_path: Option<PathBuf>,
    pub apify: ApifySettings,
}

impl Settings {
    /// Load settings from the environment (and `.env` if present).
    pub fn from_env() -> Result<Self> {
        let _ = dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load settings through `lookup`; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let storage = match var("HARVEST_STORAGE").as_deref().map(str::to_ascii_lowercase).as_deref() {
            None | Some("local") => StorageKind::Local,
            Some("apify") => StorageKind::Apify,
            Some(other) => {
                return Err(HarvestError::Config {
                    reason: format!("HARVEST_STORAGE must be 'local' or 'apify', got '{}'", other),
                })
            }
        };

        let apify = ApifySettings {
            token: var("APIFY_TOKEN"),
            key_value_store_id: var("APIFY_DEFAULT_KEY_VALUE_STORE_ID"),
            dataset_id: var("APIFY_DEFAULT_DATASET_ID"),
            proxy_password: var("APIFY_PROXY_PASSWORD"),
        };

        if storage == StorageKind::Apify {
            for (name, value) in [
                ("APIFY_TOKEN", &apify.token),
                ("APIFY_DEFAULT_KEY_VALUE_STORE_ID", &apify.key_value_store_id),
                ("APIFY_DEFAULT_DATASET_ID", &apify.dataset_id),
            ] {
                if value.is_none() {
                    return Err(HarvestError::Config {
                        reason: format!("{} must be set for Apify storage", name),
                    });
                }
            }
        }

        Ok(Self {
            storage,
            storage_dir: var("HARVEST_STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./storage")),
            input_path: var("HARVEST_INPUT").map(PathBuf::from),
            apify,
        })
    }
}

/// Read the run input from `path` if given, else from the store's `INPUT` key.
///
/// A missing input yields the defaults; an unparsable one is a config error.
pub async fn read_input<K: KeyValueStore>(store: &K, path: Option<&Path>) -> Result<HarvestInput> {
    let raw = match path {
        Some(path) => {
            let text = tokio::fs::read_to_string(path)
                .await
                .map_err(|e| HarvestError::Config {
                    reason: format!("cannot read input {}: {}", path.display(), e),
                })?;
            Some(text)
        }
        None => store
            .get(INPUT_KEY)
            .await?
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()),
    };

    match raw.filter(|r| !r.trim().is_empty()) {
        Some(raw) => HarvestInput::from_json(&raw).map_err(|e| HarvestError::Config {
            reason: format!("invalid input JSON: {}", e),
        }),
        None => {
            info!("No input found, using defaults");
            Ok(HarvestInput::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::MemoryStore;
    use serde_json::json;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_local_defaults() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings.storage, StorageKind::Local);
        assert_eq!(settings.storage_dir, PathBuf::from("./storage"));
        assert_eq!(settings.input_path, None);
    }

    #[test]
    fn test_apify_requires_ids() {
        let err = Settings::from_lookup(lookup(&[("HARVEST_STORAGE", "apify"), ("APIFY_TOKEN", "t")]))
            .unwrap_err();
        assert!(err.to_string().contains("APIFY_DEFAULT_KEY_VALUE_STORE_ID"));

        let settings = Settings::from_lookup(lookup(&[
            ("HARVEST_STORAGE", "Apify"),
            ("APIFY_TOKEN", "t"),
            ("APIFY_DEFAULT_KEY_VALUE_STORE_ID", "kv"),
            ("APIFY_DEFAULT_DATASET_ID", "ds"),
            ("APIFY_PROXY_PASSWORD", " "),
        ]))
        .unwrap();
        assert_eq!(settings.storage, StorageKind::Apify);
        assert_eq!(settings.apify.proxy_password, None);
    }

    #[test]
    fn test_unknown_storage_is_rejected() {
        assert!(Settings::from_lookup(lookup(&[("HARVEST_STORAGE", "s3")])).is_err());
    }

    #[tokio::test]
    async fn test_read_input_from_store_or_default() {
        let store = MemoryStore::new();
        let input = read_input(&store, None).await.unwrap();
        assert!(input.max_items.is_none());

        let store = MemoryStore::new().with_json(INPUT_KEY, &json!({ "maxItems": 10, "keywords": "rust" }));
        let input = read_input(&store, None).await.unwrap();
        assert_eq!(input.keywords.as_deref(), Some("rust"));
    }

    #[tokio::test]
    async fn test_read_input_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.json");
        std::fs::write(&path, r#"{ "city": "Gdańsk" }"#).unwrap();

        let input = read_input(&MemoryStore::new(), Some(path.as_path())).await.unwrap();
        assert_eq!(input.city.as_deref(), Some("Gdańsk"));

        std::fs::write(&path, "{ nope").unwrap();
        assert!(matches!(
            read_input(&MemoryStore::new(), Some(path.as_path())).await,
            Err(HarvestError::Config { .. })
        ));
    }
}
