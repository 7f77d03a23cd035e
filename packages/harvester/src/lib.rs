//! Resumable Job-Offer Harvester
//!
//! Pulls job offers from justjoin.it into an append-only dataset, one
//! canonical [`OfferRecord`] per offer, and survives interruption without
//! emitting duplicates.
//!
//! # How a run works
//!
//! 1. Load the checkpoint (`saved`, `seen`, `cursor`) from the key-value store
//! 2. Walk the cursor-paginated listing API, enriching each offer with its
//!    detail record through a fixed-width worker pool
//! 3. If the API was never reachable and nothing was ever saved, crawl the
//!    public HTML instead (JSON-LD, anchors, sitemap)
//! 4. Flush the checkpoint on completion, every 25 records, and on cancellation
//!
//! # Usage
//!
//! ```rust,ignore
//! use harvester::{Harvester, HarvestConfig, MemoryStore, ReqwestTransport, SourceClient};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! let store = Arc::new(MemoryStore::new());
//! let client = SourceClient::new(ReqwestTransport::new()?);
//! let harvester = Harvester::new(client, store.clone(), store.clone(), HarvestConfig::default());
//!
//! let summary = harvester.run(CancellationToken::new()).await?;
//! println!("saved {} offers", summary.saved);
//! ```
//!
//! # Modules
//!
//! - [`client`] - Retrying HTTP client with identity and proxy rotation
//! - [`checkpoint`] - Checkpoint persistence and the run ledger
//! - [`normalize`] - Payload to record mapping, salary and HTML cleanup
//! - [`pipeline`] - Primary and fallback pipelines, worker pool, orchestrator
//! - [`stores`] - Memory, local directory and Apify storage
//! - [`config`] - Environment settings and input loading
//! - [`testing`] - Mock transport for tests

pub mod checkpoint;
pub mod client;
pub mod config;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use checkpoint::{Accepted, CheckpointStore, RunLedger, STATE_KEY};
pub use client::{ProxyPool, ReqwestTransport, RetryPolicy, SourceClient};
pub use config::{read_input, Settings, StorageKind};
pub use error::{FetchError, HarvestError, Result, StoreError};
pub use normalize::normalize;
pub use pipeline::{Harvester, PrimaryOutcome, RunSummary, StopReason};
pub use stores::{ApifyStore, FileStore, MemoryStore};
pub use traits::{Dataset, KeyValueStore, Transport};
pub use types::{CheckpointState, HarvestConfig, HarvestInput, OfferRecord, PauseRange, SourceEndpoints};
