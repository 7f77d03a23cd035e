//! Rate/retry client for the source site.
//!
//! - `retry` - one retry-with-backoff combinator for every request kind
//! - `identity` - rotating browser identity headers
//! - `proxy` - per-attempt proxy URLs
//! - `http` - reqwest transport
//! - `source` - `SourceClient`, which ties the above together

pub mod http;
pub mod identity;
pub mod proxy;
pub mod retry;
pub mod source;

pub use http::ReqwestTransport;
pub use identity::{identity_headers, Accept, USER_AGENTS};
pub use proxy::ProxyPool;
pub use retry::{with_retry, RetryPolicy};
pub use source::SourceClient;
