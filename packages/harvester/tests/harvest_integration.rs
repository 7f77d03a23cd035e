//! End-to-end runs of the harvester against a scripted transport.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use harvester::error::StoreResult;
use harvester::testing::{offers_page, MockReply, MockTransport};
use harvester::{
    Dataset, HarvestConfig, Harvester, MemoryStore, OfferRecord, PauseRange, RunSummary,
    SourceClient, SourceEndpoints, StopReason, STATE_KEY,
};
use serde_json::json;
use tokio_util::sync::CancellationToken;

const ORIGIN: &str = "http://mock.test";

fn config() -> HarvestConfig {
    HarvestConfig::default()
        .with_pause(PauseRange::none())
        .with_endpoints(SourceEndpoints::rooted_at(ORIGIN))
}

async fn run(
    transport: &MockTransport,
    kv: &Arc<MemoryStore>,
    dataset: &Arc<MemoryStore>,
    config: HarvestConfig,
) -> RunSummary {
    let client = SourceClient::new(transport.clone()).with_origin(ORIGIN);
    Harvester::new(client, kv.clone(), dataset.clone(), config)
        .run(CancellationToken::new())
        .await
        .unwrap()
}

fn slugs(dataset: &MemoryStore) -> Vec<String> {
    dataset
        .records()
        .into_iter()
        .filter_map(|r| r.slug)
        .collect()
}

fn failing_api_with_html_site() -> MockTransport {
    MockTransport::new()
        .on("/by-cursor", MockReply::status(503))
        .on(
            "/job-offer/all-locations",
            MockReply::ok(
                r#"<html><body>
                    <a href="/job-offer/acme-rust">Rust</a>
                    <a href="/job-offer/acme-go">Go</a>
                </body></html>"#,
            ),
        )
        .on(
            "/job-offer/acme-rust",
            MockReply::ok(
                r#"<html><head><script type="application/ld+json">
                    {"@type":"JobPosting","title":"Rust Engineer","hiringOrganization":{"name":"Acme"}}
                </script></head></html>"#,
            ),
        )
        .on(
            "/job-offer/acme-go",
            MockReply::ok("<html><head><title>Go Engineer - Acme</title></head></html>"),
        )
}

#[tokio::test(start_paused = true)]
async fn test_stops_when_cursor_ends_on_page_three() {
    let transport = MockTransport::new()
        .on("cursor=c2", MockReply::json(offers_page(&["e", "f"], None)))
        .on("cursor=c1", MockReply::json(offers_page(&["c", "d"], Some("c2"))))
        .on("/by-cursor", MockReply::json(offers_page(&["a", "b"], Some("c1"))));
    let kv = Arc::new(MemoryStore::new());
    let dataset = Arc::new(MemoryStore::new());

    let summary = run(
        &transport,
        &kv,
        &dataset,
        config().with_collect_details(false).with_max_pages(10),
    )
    .await;

    assert_eq!(summary.pages, 3);
    assert_eq!(summary.stop, Some(StopReason::EndOfSequence));
    assert!(!summary.fallback_ran);
    assert_eq!(transport.request_count("/by-cursor"), 3);
    assert_eq!(slugs(&dataset), vec!["a", "b", "c", "d", "e", "f"]);

    let state = kv.json(STATE_KEY).unwrap();
    assert_eq!(state["saved"], 6);
    assert_eq!(state["seen"].as_array().unwrap().len(), 6);
}

#[tokio::test(start_paused = true)]
async fn test_quota_reached_mid_page() {
    let hundred: Vec<String> = (0..100).map(|i| format!("offer-{}", i)).collect();
    let hundred: Vec<&str> = hundred.iter().map(String::as_str).collect();
    let transport = MockTransport::new()
        .on("/by-cursor", MockReply::json(offers_page(&hundred, Some("c1"))))
        .on("candidate-api/offers/", MockReply::json(json!({ "body": "<p>Details</p>" })));
    let kv = Arc::new(MemoryStore::new());
    let dataset = Arc::new(MemoryStore::new());

    let summary = run(&transport, &kv, &dataset, config().with_max_items(Some(10))).await;

    assert_eq!(summary.saved, 10);
    assert_eq!(summary.stop, Some(StopReason::QuotaReached));
    assert_eq!(transport.request_count("/by-cursor"), 1);
    assert!(transport.requested_urls()[0].contains("itemsCount=10"));
    assert_eq!(transport.request_count("candidate-api/offers/"), 10);
    assert_eq!(dataset.record_count(), 10);
    assert_eq!(dataset.records()[0].description_text.as_deref(), Some("Details"));
}

#[tokio::test(start_paused = true)]
async fn test_detail_order_follows_listing_order() {
    let transport = MockTransport::new()
        .on("/by-cursor", MockReply::json(offers_page(&["a", "b", "c"], None)))
        .on(
            "candidate-api/offers/a",
            MockReply::json(json!({ "title": "A" })).with_delay(Duration::from_millis(300)),
        )
        .on(
            "candidate-api/offers/b",
            MockReply::json(json!({ "title": "B" })).with_delay(Duration::from_millis(10)),
        )
        .on(
            "candidate-api/offers/c",
            MockReply::json(json!({ "title": "C" })).with_delay(Duration::from_millis(200)),
        );
    let kv = Arc::new(MemoryStore::new());
    let dataset = Arc::new(MemoryStore::new());

    run(&transport, &kv, &dataset, config().with_concurrency(3)).await;

    let titles: Vec<String> = dataset.records().into_iter().filter_map(|r| r.title).collect();
    assert_eq!(titles, vec!["A", "B", "C"]);
}

#[tokio::test(start_paused = true)]
async fn test_fallback_runs_after_total_primary_failure() {
    let transport = failing_api_with_html_site();
    let kv = Arc::new(MemoryStore::new());
    let dataset = Arc::new(MemoryStore::new());

    let summary = run(&transport, &kv, &dataset, config()).await;

    assert_eq!(summary.stop, Some(StopReason::PageFailed));
    assert!(summary.fallback_ran);
    assert_eq!(transport.request_count("/by-cursor"), 3);

    let records = dataset.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].slug.as_deref(), Some("acme-rust"));
    assert_eq!(records[0].title.as_deref(), Some("Rust Engineer"));
    assert_eq!(records[1].title.as_deref(), Some("Go Engineer"));
    assert_eq!(records[1].company.as_deref(), Some("Acme"));
    assert_eq!(kv.json(STATE_KEY).unwrap()["saved"], 2);
}

#[tokio::test(start_paused = true)]
async fn test_no_fallback_when_checkpoint_carries_saved_records() {
    let transport = failing_api_with_html_site();
    let kv = Arc::new(MemoryStore::new().with_json(
        STATE_KEY,
        &json!({ "saved": 1, "seen": ["earlier"], "cursor": null }),
    ));
    let dataset = Arc::new(MemoryStore::new());

    let summary = run(&transport, &kv, &dataset, config()).await;

    assert!(!summary.fallback_ran);
    assert_eq!(summary.saved, 1);
    assert_eq!(dataset.record_count(), 0);
    assert_eq!(transport.request_count("/job-offer/"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_rerun_with_checkpoint_emits_nothing_twice() {
    let transport = MockTransport::new()
        .on("cursor=c1", MockReply::json(offers_page(&["c", "d"], None)))
        .on("/by-cursor", MockReply::json(offers_page(&["a", "b"], Some("c1"))));
    let kv = Arc::new(MemoryStore::new());
    let dataset = Arc::new(MemoryStore::new());

    let first = run(&transport, &kv, &dataset, config().with_collect_details(false)).await;
    let second = run(&transport, &kv, &dataset, config().with_collect_details(false)).await;

    assert_eq!(first.emitted, 4);
    assert_eq!(second.emitted, 0);
    assert_eq!(second.duplicates, 2);
    assert_eq!(second.saved, 4);
    assert_eq!(slugs(&dataset), vec!["a", "b", "c", "d"]);
    // the second run resumed from the stored cursor
    assert!(transport.requested_urls().last().unwrap().contains("cursor=c1"));
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_flushes_checkpoint() {
    let transport = MockTransport::new()
        .on("cursor=c1", MockReply::json(offers_page(&["c"], None)).with_delay(Duration::from_secs(20)))
        .on("/by-cursor", MockReply::json(offers_page(&["a", "b"], Some("c1"))));
    let kv = Arc::new(MemoryStore::new());
    let dataset = Arc::new(MemoryStore::new());

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        trigger.cancel();
    });

    let client = SourceClient::new(transport.clone()).with_origin(ORIGIN);
    let summary = Harvester::new(
        client,
        kv.clone(),
        dataset.clone(),
        config().with_collect_details(false),
    )
    .run(cancel)
    .await
    .unwrap();

    assert!(summary.cancelled);
    assert_eq!(summary.saved, 2);

    let state = kv.json(STATE_KEY).unwrap();
    assert_eq!(state["saved"], 2);
    assert_eq!(state["cursor"], "c1");
}

/// Dataset whose write lands immediately but whose acknowledgement is slow.
#[derive(Default)]
struct SlowAckDataset {
    slugs: RwLock<Vec<String>>,
}

#[async_trait]
impl Dataset for SlowAckDataset {
    async fn push(&self, record: &OfferRecord) -> StoreResult<()> {
        self.slugs
            .write()
            .unwrap()
            .push(record.slug.clone().unwrap_or_default());
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_push_does_not_reemit_on_resume() {
    let transport = MockTransport::new().on("/by-cursor", MockReply::json(offers_page(&["a"], None)));
    let kv = Arc::new(MemoryStore::new());
    let dataset = Arc::new(SlowAckDataset::default());
    let harvester = || {
        let client = SourceClient::new(transport.clone()).with_origin(ORIGIN);
        Harvester::new(
            client,
            kv.clone(),
            dataset.clone(),
            config().with_collect_details(false),
        )
    };

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        trigger.cancel();
    });
    let first = harvester().run(cancel).await.unwrap();
    assert!(first.cancelled);
    assert_eq!(kv.json(STATE_KEY).unwrap()["seen"], json!(["a"]));

    let second = harvester().run(CancellationToken::new()).await.unwrap();

    assert!(!second.cancelled);
    assert_eq!(second.duplicates, 1);
    assert_eq!(*dataset.slugs.read().unwrap(), vec!["a"]);
}
