//! reqwest-backed transport.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::error::{FetchError, FetchResult};
use crate::traits::transport::{HttpRequest, HttpResponse, Transport};

/// HTTP transport over reqwest.
///
/// Direct requests share one pooled client. A request that names a proxy
/// gets a client built for that proxy, because reqwest binds proxies at
/// client construction and every attempt may use a different proxy URL.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> reqwest::Result<Self> {
        Ok(Self {
            client: Self::builder().build()?,
        })
    }

    fn builder() -> reqwest::ClientBuilder {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .redirect(reqwest::redirect::Policy::limited(5))
    }

    fn client_for(&self, proxy: Option<&str>) -> FetchResult<reqwest::Client> {
        let Some(proxy) = proxy else {
            return Ok(self.client.clone());
        };
        let proxy = reqwest::Proxy::all(proxy).map_err(|e| FetchError::transport(proxy, e))?;
        Self::builder()
            .proxy(proxy)
            .build()
            .map_err(|e| FetchError::transport("proxy client", e))
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> FetchResult<HttpResponse> {
        let client = self.client_for(request.proxy.as_deref())?;

        let mut builder = client.get(&request.url).timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let url = request.url.clone();
        let classify = |e: reqwest::Error| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.clone(),
                    timeout: request.timeout,
                }
            } else {
                FetchError::transport(url.clone(), e)
            }
        };

        let response = builder.send().await.map_err(classify)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(classify)?;

        debug!(url = %request.url, status, bytes = body.len(), "HTTP fetch complete");
        Ok(HttpResponse { status, body })
    }
}
