//! Typed errors for the harvester library.
//!
//! Uses `thiserror` for library errors (not `anyhow`); the `harvest` binary
//! wraps these with context.

use std::time::Duration;
use thiserror::Error;

/// Errors that abort a harvest run.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// Checkpoint store or dataset failed
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Input or environment is unusable
    #[error("config error: {reason}")]
    Config { reason: String },
}

/// Errors from a single outbound request (after or between retries).
#[derive(Debug, Error)]
pub enum FetchError {
    /// Non-2xx response
    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// Connect, TLS, proxy or body read failure
    #[error("transport error for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// No response within the per-request timeout
    #[error("timeout after {timeout:?}: {url}")]
    Timeout { url: String, timeout: Duration },

    /// Body was not the expected JSON shape
    #[error("invalid JSON from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// URL could not be built or parsed
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },
}

impl FetchError {
    pub fn transport(
        url: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Transport {
            url: url.into(),
            source: source.into(),
        }
    }
}

/// Errors from the key-value store or the dataset.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Remote backend (e.g. the Apify API) rejected the operation
    #[error("backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<apify_client::ApifyError> for StoreError {
    fn from(err: apify_client::ApifyError) -> Self {
        StoreError::Backend(Box::new(err))
    }
}

/// Result type alias for harvest operations.
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for storage operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
