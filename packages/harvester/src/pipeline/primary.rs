//! Cursor-paginated listing API with concurrent detail enrichment.

use std::fmt;
use tracing::{debug, info, warn};
use url::Url;

use crate::checkpoint::{Accepted, RunLedger};
use crate::client::SourceClient;
use crate::error::{FetchError, FetchResult, StoreResult};
use crate::normalize::normalize;
use crate::traits::store::{Dataset, KeyValueStore};
use crate::traits::transport::Transport;
use crate::types::{ApiOffer, HarvestConfig, OfferRecord, OffersPage};

use super::pacing::pause;
use super::pool::map_ordered;

/// Why the primary pipeline stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    MaxPages,
    QuotaReached,
    EmptyPage,
    /// The source reported no further cursor
    EndOfSequence,
    /// A page request exhausted its retries
    PageFailed,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StopReason::MaxPages => "max_pages",
            StopReason::QuotaReached => "quota_reached",
            StopReason::EmptyPage => "empty_page",
            StopReason::EndOfSequence => "end_of_sequence",
            StopReason::PageFailed => "page_failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimaryOutcome {
    /// At least one page was fetched successfully
    pub touched: bool,
    pub pages: u32,
    pub stop: StopReason,
}

pub struct PrimaryPipeline<'a, T: Transport> {
    client: &'a SourceClient<T>,
    config: &'a HarvestConfig,
}

impl<'a, T: Transport> PrimaryPipeline<'a, T> {
    pub fn new(client: &'a SourceClient<T>, config: &'a HarvestConfig) -> Self {
        Self { client, config }
    }

    /// Listing URL for one page. The cursor is omitted on the first page.
    pub fn page_url(&self, cursor: Option<&str>, items_count: usize) -> FetchResult<String> {
        let base = &self.config.endpoints.listing_api;
        let mut url = Url::parse(base).map_err(|_| FetchError::InvalidUrl { url: base.clone() })?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("itemsCount", &items_count.to_string());
            query.append_pair("sortBy", self.config.sort_by.as_str());
            query.append_pair("orderBy", self.config.order_by.as_str());
            if let Some(cursor) = cursor {
                query.append_pair("cursor", cursor);
            }
            for (name, value) in self.config.filters.query_pairs() {
                query.append_pair(name, &value);
            }
        }
        Ok(url.into())
    }

    /// Walk pages until a stop condition, handing records to `ledger`.
    ///
    /// Fetch failures end the walk softly; only storage failures are errors.
    pub async fn run<K, D>(&self, ledger: &mut RunLedger<'_, K, D>) -> StoreResult<PrimaryOutcome>
    where
        K: KeyValueStore,
        D: Dataset,
    {
        let mut touched = false;
        let mut pages = 0u32;

        let stop = loop {
            if pages >= self.config.max_pages {
                break StopReason::MaxPages;
            }
            let items_count = ledger.take_limit(self.config.page_size);
            if items_count == 0 {
                break StopReason::QuotaReached;
            }
            let page_no = pages + 1;

            let url = match self.page_url(ledger.cursor(), items_count) {
                Ok(url) => url,
                Err(e) => {
                    warn!(page = page_no, error = %e, "Cannot build listing URL");
                    break StopReason::PageFailed;
                }
            };

            let page: OffersPage = match self.client.fetch_json(&url).await {
                Ok(page) => page,
                Err(e) => {
                    warn!(page = page_no, error = %e, "Listing page failed");
                    break StopReason::PageFailed;
                }
            };
            touched = true;
            pages = page_no;

            if page.data.is_empty() {
                info!(page = page_no, "No more offers");
                break StopReason::EmptyPage;
            }

            let next_cursor = page.next_cursor();
            info!(
                page = page_no,
                offers = page.data.len(),
                total = ?page.total_items(),
                "Fetched listing page"
            );

            let limit = ledger.take_limit(page.data.len());
            let offers: Vec<ApiOffer> = page.data.into_iter().take(limit).collect();

            for record in self.build_records(offers).await {
                if ledger.accept(record).await? == Accepted::QuotaReached {
                    break;
                }
            }

            let Some(cursor) = next_cursor else {
                info!(page = page_no, "Reached last page");
                break StopReason::EndOfSequence;
            };
            ledger.set_cursor(Some(cursor));

            if ledger.quota_reached() {
                break StopReason::QuotaReached;
            }
            pause(self.config.pause).await;
        };

        Ok(PrimaryOutcome {
            touched,
            pages,
            stop,
        })
    }

    /// Normalize one page of offers, enriching each with its detail when enabled.
    async fn build_records(&self, offers: Vec<ApiOffer>) -> Vec<OfferRecord> {
        let endpoints = &self.config.endpoints;
        if !self.config.collect_details {
            return offers
                .iter()
                .map(|offer| normalize(offer, None, endpoints))
                .collect();
        }

        map_ordered(offers, self.config.concurrency, |offer| async move {
            let detail = self.fetch_detail(&offer).await;
            normalize(&offer, detail.as_ref(), endpoints)
        })
        .await
    }

    /// Detail payload for `offer`, or `None` when it can't be fetched.
    async fn fetch_detail(&self, offer: &ApiOffer) -> Option<ApiOffer> {
        let slug = offer.slug.as_deref().filter(|s| !s.is_empty())?;
        match self
            .client
            .fetch_json::<ApiOffer>(&self.config.endpoints.detail_url(slug))
            .await
        {
            Ok(detail) => {
                pause(self.config.pause).await;
                Some(detail)
            }
            Err(e) => {
                debug!(slug, error = %e, "Detail fetch failed, using summary only");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::CheckpointStore;
    use crate::stores::MemoryStore;
    use crate::testing::{offers_page, MockReply, MockTransport};
    use crate::types::{CheckpointState, PauseRange, SourceEndpoints};
    use serde_json::json;

    fn config() -> HarvestConfig {
        HarvestConfig::default()
            .with_pause(PauseRange::none())
            .with_endpoints(SourceEndpoints::rooted_at("http://mock.test"))
    }

    #[test]
    fn test_page_url_params() {
        let transport = MockTransport::new();
        let client = SourceClient::new(transport);
        let mut config = config();
        config.filters.keywords = Some("rust dev".into());
        config.filters.city = Some("Kraków".into());
        config.filters.city_radius_km = Some(30);
        let pipeline = PrimaryPipeline::new(&client, &config);

        let first = pipeline.page_url(None, 100).unwrap();
        assert_eq!(
            first,
            "http://mock.test/v2/user-panel/offers/by-cursor?itemsCount=100&sortBy=published&orderBy=DESC\
             &keywords=rust+dev&city=Krak%C3%B3w&cityRadiusKm=30"
        );

        let next = pipeline.page_url(Some("100"), 7).unwrap();
        assert!(next.contains("itemsCount=7&sortBy=published&orderBy=DESC&cursor=100&"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_detail_failure_degrades_to_summary() {
        let transport = MockTransport::new()
            .on("/by-cursor", MockReply::json(offers_page(&["a", "b"], None)))
            .on("/offers/a", MockReply::json(json!({ "slug": "a", "title": "Full A", "body": "<p>A</p>" })))
            .on("/offers/b", MockReply::status(404));
        let client = SourceClient::new(transport.clone());
        let config = config();

        let kv = MemoryStore::new();
        let dataset = MemoryStore::new();
        let checkpoint = CheckpointStore::new(&kv);
        let mut ledger = RunLedger::new(&checkpoint, &dataset, CheckpointState::new(), None);

        let outcome = PrimaryPipeline::new(&client, &config)
            .run(&mut ledger)
            .await
            .unwrap();

        assert_eq!(outcome.stop, StopReason::EndOfSequence);
        assert!(outcome.touched);
        let records = dataset.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title.as_deref(), Some("Full A"));
        assert_eq!(records[0].description_text.as_deref(), Some("A"));
        assert_eq!(records[1].title.as_deref(), Some("Offer b"));
        assert_eq!(records[1].description_html, None);
        assert_eq!(transport.request_count("candidate-api/offers/b"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_first_page_is_untouched_soft_stop() {
        let transport = MockTransport::new().on("/by-cursor", MockReply::status(503));
        let client = SourceClient::new(transport.clone());
        let config = config();

        let kv = MemoryStore::new();
        let dataset = MemoryStore::new();
        let checkpoint = CheckpointStore::new(&kv);
        let mut ledger = RunLedger::new(&checkpoint, &dataset, CheckpointState::new(), None);

        let outcome = PrimaryPipeline::new(&client, &config)
            .run(&mut ledger)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            PrimaryOutcome {
                touched: false,
                pages: 0,
                stop: StopReason::PageFailed
            }
        );
        assert_eq!(transport.request_count("/by-cursor"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resumes_from_checkpoint_cursor() {
        let transport = MockTransport::new()
            .on("cursor=c5", MockReply::json(offers_page(&["z"], None)))
            .on("/by-cursor", MockReply::json(offers_page(&["first"], Some("c1"))));
        let client = SourceClient::new(transport.clone());
        let config = config().with_collect_details(false);

        let kv = MemoryStore::new();
        let dataset = MemoryStore::new();
        let checkpoint = CheckpointStore::new(&kv);
        let mut state = CheckpointState::new();
        state.cursor = Some("c5".into());
        let mut ledger = RunLedger::new(&checkpoint, &dataset, state, None);

        PrimaryPipeline::new(&client, &config)
            .run(&mut ledger)
            .await
            .unwrap();

        assert_eq!(transport.requested_urls().len(), 1);
        assert_eq!(dataset.records()[0].slug.as_deref(), Some("z"));
        assert_eq!(ledger.cursor(), Some("c5"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_page_stops_walk() {
        let transport = MockTransport::new()
            .on("cursor=c1", MockReply::json(offers_page(&[], Some("c2"))))
            .on("/by-cursor", MockReply::json(offers_page(&["a"], Some("c1"))));
        let client = SourceClient::new(transport.clone());
        let config = config().with_collect_details(false);
        let kv = MemoryStore::new();
        let dataset = MemoryStore::new();
        let checkpoint = CheckpointStore::new(&kv);
        let mut ledger = RunLedger::new(&checkpoint, &dataset, CheckpointState::new(), None);

        let outcome = PrimaryPipeline::new(&client, &config)
            .run(&mut ledger)
            .await
            .unwrap();

        assert_eq!(outcome.stop, StopReason::EmptyPage);
        assert_eq!(outcome.pages, 2);
        assert_eq!(transport.request_count("cursor=c2"), 0);
        assert_eq!(dataset.record_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_max_pages_stops_walk() {
        let transport = MockTransport::new()
            .on("cursor=c2", MockReply::json(offers_page(&["c"], Some("c3"))))
            .on("cursor=c1", MockReply::json(offers_page(&["b"], Some("c2"))))
            .on("/by-cursor", MockReply::json(offers_page(&["a"], Some("c1"))));
        let client = SourceClient::new(transport.clone());
        let config = config().with_collect_details(false).with_max_pages(2);
        let kv = MemoryStore::new();
        let dataset = MemoryStore::new();
        let checkpoint = CheckpointStore::new(&kv);
        let mut ledger = RunLedger::new(&checkpoint, &dataset, CheckpointState::new(), None);

        let outcome = PrimaryPipeline::new(&client, &config)
            .run(&mut ledger)
            .await
            .unwrap();

        assert_eq!(outcome.stop, StopReason::MaxPages);
        assert_eq!(outcome.pages, 2);
        assert_eq!(transport.request_count("/by-cursor"), 2);
        assert_eq!(ledger.cursor(), Some("c2"));
    }
}
