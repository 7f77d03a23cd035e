//! Testing utilities including mock implementations.
//!
//! These are useful for exercising the pipelines without network access.
//! Storage mocks live in [`crate::stores::MemoryStore`].

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::error::FetchResult;
use crate::traits::transport::{HttpRequest, HttpResponse, Transport};

/// A canned response.
#[derive(Debug, Clone)]
pub struct MockReply {
    pub status: u16,
    pub body: String,
    /// Simulated latency before the reply is returned
    pub delay: Duration,
}

impl MockReply {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    pub fn json(value: Value) -> Self {
        Self::ok(value.to_string())
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Debug)]
struct Route {
    needle: String,
    replies: VecDeque<MockReply>,
}

/// Mock transport with scripted replies.
///
/// Routes are matched in registration order: the first route whose needle is
/// a substring of the request URL answers. A route replays its replies in
/// order and keeps repeating the last one. Unmatched URLs get a 404.
///
/// # Example
///
/// ```rust
/// use harvester::testing::{MockReply, MockTransport};
///
/// let transport = MockTransport::new()
///     .on("cursor=c2", MockReply::json(serde_json::json!({ "data": [] })))
///     .on("/by-cursor", MockReply::status(500));
/// ```
#[derive(Debug, Default, Clone)]
pub struct MockTransport {
    routes: Arc<RwLock<Vec<Route>>>,
    requests: Arc<RwLock<Vec<HttpRequest>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer URLs containing `needle` with `reply`, forever.
    pub fn on(self, needle: impl Into<String>, reply: MockReply) -> Self {
        self.on_sequence(needle, vec![reply])
    }

    /// Answer URLs containing `needle` with `replies` in order; the last repeats.
    pub fn on_sequence(self, needle: impl Into<String>, replies: Vec<MockReply>) -> Self {
        self.routes.write().unwrap().push(Route {
            needle: needle.into(),
            replies: replies.into(),
        });
        self
    }

    /// All requests seen so far, in arrival order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.read().unwrap().clone()
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.requests
            .read()
            .unwrap()
            .iter()
            .map(|r| r.url.clone())
            .collect()
    }

    /// Number of requests whose URL contains `needle`.
    pub fn request_count(&self, needle: &str) -> usize {
        self.requests
            .read()
            .unwrap()
            .iter()
            .filter(|r| r.url.contains(needle))
            .count()
    }

    fn next_reply(&self, url: &str) -> MockReply {
        let mut routes = self.routes.write().unwrap();
        let Some(route) = routes.iter_mut().find(|r| url.contains(&r.needle)) else {
            return MockReply::status(404);
        };
        if route.replies.len() > 1 {
            route.replies.pop_front().unwrap_or_else(|| MockReply::status(404))
        } else {
            route
                .replies
                .front()
                .cloned()
                .unwrap_or_else(|| MockReply::status(404))
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: HttpRequest) -> FetchResult<HttpResponse> {
        let reply = self.next_reply(&request.url);
        self.requests.write().unwrap().push(request);

        if !reply.delay.is_zero() {
            tokio::time::sleep(reply.delay).await;
        }
        Ok(HttpResponse::new(reply.status, reply.body))
    }
}

/// Build a listing page payload for `slugs` with an optional next cursor.
pub fn offers_page(slugs: &[&str], next_cursor: Option<&str>) -> Value {
    let data: Vec<Value> = slugs
        .iter()
        .map(|slug| {
            serde_json::json!({
                "slug": slug,
                "guid": format!("guid-{}", slug),
                "title": format!("Offer {}", slug),
                "companyName": "Acme",
                "employmentTypes": [
                    { "type": "b2b", "from": 5000, "to": 9000, "currency": "pln", "unit": "month", "currencySource": "original" }
                ],
            })
        })
        .collect();
    let next = next_cursor.map(|c| serde_json::json!({ "cursor": c }));
    serde_json::json!({
        "data": data,
        "meta": { "totalItems": slugs.len(), "next": next },
    })
}
