use thiserror::Error;

/// Errors returned by [`crate::ApifyClient`].
#[derive(Debug, Error)]
pub enum ApifyError {
    /// Transport-level failure (connect, TLS, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response from the Apify API
    #[error("Apify API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Record body could not be encoded or decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ApifyError>;
