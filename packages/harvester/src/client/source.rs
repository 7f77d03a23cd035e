//! `SourceClient`: the one way the pipelines talk to the source site.

use serde::de::DeserializeOwned;

use crate::error::{FetchError, FetchResult};
use crate::traits::transport::{HttpRequest, Transport};

use super::identity::{identity_headers, Accept};
use super::proxy::ProxyPool;
use super::retry::{with_retry, RetryPolicy};

/// Client for the source site: retry, identity rotation, proxies, timeouts.
///
/// Holds no mutable state; safe to share across the worker pool by reference.
pub struct SourceClient<T: Transport> {
    transport: T,
    policy: RetryPolicy,
    proxy: Option<ProxyPool>,
    origin: String,
}

impl<T: Transport> SourceClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            policy: RetryPolicy::default(),
            proxy: None,
            origin: "https://justjoin.it".to_string(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_proxy(mut self, proxy: Option<ProxyPool>) -> Self {
        self.proxy = proxy;
        self
    }

    /// Origin used for the Referer/Origin headers.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// GET `url` and decode the body as JSON. Decode failures are retried.
    pub async fn fetch_json<V: DeserializeOwned>(&self, url: &str) -> FetchResult<V> {
        with_retry(&self.policy, url, |_| async move {
            let body = self.get_once(url, Accept::Json).await?;
            serde_json::from_str(&body).map_err(|source| FetchError::Decode {
                url: url.to_string(),
                source,
            })
        })
        .await
    }

    /// GET `url` and return the body as text.
    pub async fn fetch_text(&self, url: &str) -> FetchResult<String> {
        with_retry(&self.policy, url, |_| self.get_once(url, Accept::Html)).await
    }

    async fn get_once(&self, url: &str, accept: Accept) -> FetchResult<String> {
        let mut request = HttpRequest::get(url)
            .with_proxy(self.proxy.as_ref().and_then(ProxyPool::new_url))
            .with_timeout(self.policy.timeout);
        for (name, value) in identity_headers(accept, &self.origin) {
            request = request.with_header(name, value);
        }

        let response = self.transport.execute(request).await?;
        if !response.is_success() {
            return Err(FetchError::Status {
                status: response.status,
                url: url.to_string(),
            });
        }
        Ok(response.body)
    }
}
