//! Structural HTML crawl used when the listing API is unreachable.
//!
//! List pages yield candidate offer URLs (see [`super::discover`]); each URL
//! is then fetched as a detail page and turned into a degraded record from
//! its JSON-LD `JobPosting`, or from the page title when there is none.

use serde_json::{Number, Value};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};
use url::Url;

use crate::checkpoint::{Accepted, RunLedger};
use crate::client::SourceClient;
use crate::error::StoreResult;
use crate::normalize::{clean_text, format_salary, sanitize_html, MAX_EMPLOYMENT_TYPES};
use crate::traits::store::{Dataset, KeyValueStore};
use crate::traits::transport::Transport;
use crate::types::{EmploymentType, HarvestConfig, OfferRecord};

use super::discover::{
    anchor_links, job_posting, page_title, sitemap_links, slug_from_url, structured_data_links,
    LinkStrategy,
};
use super::pool::map_ordered;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FallbackOutcome {
    pub list_pages: u32,
    pub detail_pages: u32,
    /// Pages that exhausted their retries
    pub dropped: u32,
}

pub struct FallbackPipeline<'a, T: Transport> {
    client: &'a SourceClient<T>,
    config: &'a HarvestConfig,
    sitemap: OnceCell<Vec<String>>,
}

impl<'a, T: Transport> FallbackPipeline<'a, T> {
    pub fn new(client: &'a SourceClient<T>, config: &'a HarvestConfig) -> Self {
        Self {
            client,
            config,
            sitemap: OnceCell::new(),
        }
    }

    /// List pages to crawl: the first start URL (or the default listing) with
    /// the configured ordering applied, then any further start URLs as given.
    pub fn list_urls(&self) -> Vec<String> {
        let endpoints = &self.config.endpoints;
        let mut start = self.config.start_urls.iter();
        let first = start
            .next()
            .map(String::as_str)
            .unwrap_or(&endpoints.default_list_url);

        let first = match Url::parse(first) {
            Ok(mut url) => {
                let kept: Vec<(String, String)> = url
                    .query_pairs()
                    .filter(|(k, _)| k != "orderBy" && k != "sortBy")
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect();
                url.query_pairs_mut()
                    .clear()
                    .extend_pairs(kept)
                    .append_pair("orderBy", self.config.order_by.as_str())
                    .append_pair("sortBy", self.config.sort_by.as_str());
                url.to_string()
            }
            Err(_) => endpoints.default_list_url.clone(),
        };

        std::iter::once(first).chain(start.cloned()).collect()
    }

    pub async fn run<K, D>(&self, ledger: &mut RunLedger<'_, K, D>) -> StoreResult<FallbackOutcome>
    where
        K: KeyValueStore,
        D: Dataset,
    {
        warn!("Falling back to HTML parsing");
        let mut outcome = FallbackOutcome::default();

        for (index, list_url) in self.list_urls().iter().enumerate() {
            if ledger.quota_reached() {
                break;
            }

            let body = match self.client.fetch_text(list_url).await {
                Ok(body) => body,
                Err(e) => {
                    warn!(url = %list_url, error = %e, "List page dropped");
                    outcome.dropped += 1;
                    continue;
                }
            };
            outcome.list_pages += 1;

            let links = self.discover_links(&body, index == 0).await;
            if links.is_empty() {
                warn!(url = %list_url, "No offer URLs found");
                continue;
            }
            let limit = ledger.take_limit(links.len());
            let batch: Vec<String> = links.into_iter().take(limit).collect();

            if !self.config.collect_details {
                for url in batch {
                    if ledger.accept(OfferRecord::from_url(url)).await? == Accepted::QuotaReached {
                        break;
                    }
                }
                continue;
            }

            let records = map_ordered(batch, self.config.concurrency, |url| async move {
                self.detail_record(&url).await
            })
            .await;

            for record in records {
                let Some(record) = record else {
                    outcome.dropped += 1;
                    continue;
                };
                outcome.detail_pages += 1;
                if ledger.accept(record).await? == Accepted::QuotaReached {
                    break;
                }
            }
        }

        info!(
            list_pages = outcome.list_pages,
            detail_pages = outcome.detail_pages,
            dropped = outcome.dropped,
            "HTML fallback finished"
        );
        Ok(outcome)
    }

    /// Try each [`LinkStrategy`] in order until one yields URLs.
    async fn discover_links(&self, body: &str, first_page: bool) -> Vec<String> {
        for strategy in LinkStrategy::ORDER {
            let links = match strategy {
                LinkStrategy::StructuredData => structured_data_links(body),
                LinkStrategy::Anchors => match Url::parse(&self.config.endpoints.site_origin) {
                    Ok(origin) => anchor_links(body, &origin),
                    Err(_) => Vec::new(),
                },
                LinkStrategy::Sitemap if first_page => self.sitemap_urls().await.to_vec(),
                LinkStrategy::Sitemap => Vec::new(),
            };
            if !links.is_empty() {
                debug!(?strategy, count = links.len(), "Discovered offer links");
                return links;
            }
        }
        Vec::new()
    }

    /// Sitemap offer URLs, fetched at most once per run. A failed fetch caches
    /// an empty list.
    async fn sitemap_urls(&self) -> &[String] {
        self.sitemap
            .get_or_init(|| async {
                match self.client.fetch_text(&self.config.endpoints.sitemap_url).await {
                    Ok(body) => {
                        let urls = sitemap_links(&body);
                        if !urls.is_empty() {
                            info!(count = urls.len(), "Sitemap fallback found offers");
                        }
                        urls
                    }
                    Err(e) => {
                        warn!(error = %e, "Sitemap fallback failed");
                        Vec::new()
                    }
                }
            })
            .await
    }

    async fn detail_record(&self, url: &str) -> Option<OfferRecord> {
        match self.client.fetch_text(url).await {
            Ok(body) => Some(record_from_detail_page(url, &body)),
            Err(e) => {
                warn!(url, error = %e, "Detail page dropped");
                None
            }
        }
    }
}

/// Build a degraded record from a detail page's markup.
pub fn record_from_detail_page(url: &str, html: &str) -> OfferRecord {
    let posting = job_posting(html).unwrap_or(Value::Null);

    let mut title = string_at(&posting, &["title"]).or_else(|| string_at(&posting, &["name"]));
    let mut company = string_at(&posting, &["hiringOrganization", "name"]);
    if title.is_none() || company.is_none() {
        if let Some((head, rest)) = page_title(html).as_deref().and_then(|t| t.split_once(" - ")) {
            title = title.or_else(|| non_empty(head));
            company = company.or_else(|| non_empty(rest));
        }
    }

    let address = first_of(posting.get("jobLocation")).and_then(|l| l.get("address"));
    let description = string_at(&posting, &["description"]);
    let description_html = description.as_deref().and_then(sanitize_html);
    let description_text = description_html
        .as_deref()
        .or(description.as_deref())
        .and_then(clean_text);

    OfferRecord {
        slug: slug_from_url(url),
        title,
        company,
        company_logo: string_at(&posting, &["hiringOrganization", "logo"])
            .or_else(|| string_at(&posting, &["hiringOrganization", "logo", "url"])),
        location: address.and_then(|a| string_at(a, &["addressLocality"])),
        country_code: address.and_then(|a| {
            string_at(a, &["addressCountry"]).or_else(|| string_at(a, &["addressCountry", "name"]))
        }),
        employment_types: employment_types(posting.get("employmentType")),
        salary: base_salary(posting.get("baseSalary")),
        date_posted: string_at(&posting, &["datePosted"]),
        description_html,
        description_text,
        url: Some(url.to_string()),
        ..Default::default()
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

fn string_at(value: &Value, path: &[&str]) -> Option<String> {
    let mut current = value;
    for key in path {
        current = current.get(key)?;
    }
    current.as_str().and_then(non_empty)
}

/// The value itself, or the first element when it is an array.
fn first_of(value: Option<&Value>) -> Option<&Value> {
    match value? {
        Value::Array(items) => items.first(),
        other => Some(other),
    }
}

fn employment_types(value: Option<&Value>) -> Option<Vec<EmploymentType>> {
    let kinds: Vec<&str> = match value? {
        Value::String(s) => vec![s.as_str()],
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        _ => return None,
    };
    let types: Vec<EmploymentType> = kinds
        .into_iter()
        .filter_map(non_empty)
        .take(MAX_EMPLOYMENT_TYPES)
        .map(|kind| EmploymentType {
            kind,
            salary_from: None,
            salary_to: None,
            currency: None,
            unit: None,
        })
        .collect();
    (!types.is_empty()).then_some(types)
}

/// `MonetaryAmount` → salary summary.
fn base_salary(value: Option<&Value>) -> Option<String> {
    let salary = first_of(value)?;
    let amount = salary.get("value");

    let (from, to) = match amount {
        Some(band @ Value::Object(_)) => (
            band.get("minValue")
                .and_then(number)
                .or_else(|| band.get("value").and_then(number)),
            band.get("maxValue").and_then(number),
        ),
        Some(other) => (number(other), None),
        None => (None, None),
    };

    format_salary(
        from.as_ref(),
        to.as_ref(),
        string_at(salary, &["currency"]).as_deref(),
        amount.and_then(|a| string_at(a, &["unitText"])).as_deref(),
    )
}

fn number(value: &Value) -> Option<Number> {
    match value {
        Value::Number(n) => Some(n.clone()),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .map(Number::from)
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(Number::from_f64))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::CheckpointStore;
    use crate::stores::MemoryStore;
    use crate::testing::{MockReply, MockTransport};
    use crate::types::{CheckpointState, PauseRange, SourceEndpoints};

    const POSTING: &str = r#"<html><head><title>Ignored - Title</title>
        <script type="application/ld+json">{
            "@type": "JobPosting",
            "title": "Senior Rust Engineer",
            "datePosted": "2024-05-01T10:00:00Z",
            "employmentType": ["CONTRACTOR", "FULL_TIME"],
            "hiringOrganization": { "name": "Acme", "logo": "https://img/acme.png" },
            "jobLocation": [{ "address": { "addressLocality": "Wrocław", "addressCountry": "PL" } }],
            "baseSalary": { "currency": "pln", "value": { "minValue": 20000, "maxValue": "28000", "unitText": "MONTH" } },
            "description": "<p data-x=\"1\">Write <em>Rust</em></p><script>x()</script>"
        }</script></head><body></body></html>"#;

    #[test]
    fn test_record_from_job_posting() {
        let record = record_from_detail_page("https://justjoin.it/job-offer/acme-senior-rust", POSTING);

        assert_eq!(record.slug.as_deref(), Some("acme-senior-rust"));
        assert_eq!(record.title.as_deref(), Some("Senior Rust Engineer"));
        assert_eq!(record.company.as_deref(), Some("Acme"));
        assert_eq!(record.company_logo.as_deref(), Some("https://img/acme.png"));
        assert_eq!(record.location.as_deref(), Some("Wrocław"));
        assert_eq!(record.country_code.as_deref(), Some("PL"));
        assert_eq!(record.salary.as_deref(), Some("20000 - 28000 PLN / month"));
        assert_eq!(record.employment_types.as_ref().map(Vec::len), Some(2));
        assert_eq!(record.description_html.as_deref(), Some("<p>Write <em>Rust</em></p>"));
        assert_eq!(record.description_text.as_deref(), Some("Write Rust"));
        assert_eq!(record.date_posted.as_deref(), Some("2024-05-01T10:00:00Z"));
    }

    #[test]
    fn test_record_from_title_only() {
        let html = "<html><head><title>Go Developer - Acme - Remote</title></head></html>";
        let record = record_from_detail_page("https://justjoin.it/job-offer/acme-go", html);

        assert_eq!(record.title.as_deref(), Some("Go Developer"));
        assert_eq!(record.company.as_deref(), Some("Acme - Remote"));
        assert_eq!(record.salary, None);
        assert_eq!(record.employment_types, None);
        assert_eq!(record.url.as_deref(), Some("https://justjoin.it/job-offer/acme-go"));
    }

    fn config() -> HarvestConfig {
        HarvestConfig::default()
            .with_pause(PauseRange::none())
            .with_endpoints(SourceEndpoints::rooted_at("http://mock.test"))
    }

    #[test]
    fn test_list_urls_apply_ordering() {
        let client = SourceClient::new(MockTransport::new());
        let config = config().with_start_urls([
            "https://justjoin.it/job-offer/all-locations/rust?orderBy=ASC&remote=yes",
            "https://justjoin.it/job-offer/all-locations/go",
        ]);
        let pipeline = FallbackPipeline::new(&client, &config);

        assert_eq!(
            pipeline.list_urls(),
            vec![
                "https://justjoin.it/job-offer/all-locations/rust?remote=yes&orderBy=DESC&sortBy=published",
                "https://justjoin.it/job-offer/all-locations/go",
            ]
        );

        let config = config.with_start_urls(["::not a url::"]);
        let pipeline = FallbackPipeline::new(&client, &config);
        assert_eq!(pipeline.list_urls(), vec!["http://mock.test/job-offer/all-locations"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sitemap_used_once_when_list_has_no_links() {
        let transport = MockTransport::new()
            .on(
                "/sitemap.xml",
                MockReply::ok(
                    "<loc>https://justjoin.it/job-offer/s1</loc><loc>https://justjoin.it/job-offer/s2</loc>",
                ),
            )
            .on("/all-locations", MockReply::ok("<html><body>nothing</body></html>"));
        let client = SourceClient::new(transport.clone());
        let config = config().with_collect_details(false);
        let pipeline = FallbackPipeline::new(&client, &config);

        let kv = MemoryStore::new();
        let dataset = MemoryStore::new();
        let checkpoint = CheckpointStore::new(&kv);
        let mut ledger = RunLedger::new(&checkpoint, &dataset, CheckpointState::new(), None);

        let outcome = pipeline.run(&mut ledger).await.unwrap();
        assert_eq!(outcome.list_pages, 1);

        let urls: Vec<_> = dataset.records().into_iter().filter_map(|r| r.url).collect();
        assert_eq!(urls, vec!["https://justjoin.it/job-offer/s1", "https://justjoin.it/job-offer/s2"]);

        assert_eq!(pipeline.sitemap_urls().await.len(), 2);
        assert_eq!(transport.request_count("/sitemap.xml"), 1);
    }

    fn list_with_links(slugs: &[&str]) -> MockReply {
        let anchors: String = slugs
            .iter()
            .map(|slug| format!(r#"<a href="/job-offer/{}">{}</a>"#, slug, slug))
            .collect();
        MockReply::ok(format!("<html><body>{}</body></html>", anchors))
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_detail_page_is_dropped() {
        let transport = MockTransport::new()
            .on("/all-locations", list_with_links(&["d1", "d2", "d3"]))
            .on("/job-offer/d2", MockReply::status(503))
            .on("/job-offer/d", MockReply::ok("<title>Rust Dev - Acme</title>"));
        let client = SourceClient::new(transport.clone());
        let config = config();
        let pipeline = FallbackPipeline::new(&client, &config);

        let kv = MemoryStore::new();
        let dataset = MemoryStore::new();
        let checkpoint = CheckpointStore::new(&kv);
        let mut ledger = RunLedger::new(&checkpoint, &dataset, CheckpointState::new(), None);

        let outcome = pipeline.run(&mut ledger).await.unwrap();

        assert_eq!(outcome.detail_pages, 2);
        assert_eq!(outcome.dropped, 1);
        assert_eq!(transport.request_count("/job-offer/d2"), 3);
        let slugs: Vec<_> = dataset.records().into_iter().filter_map(|r| r.slug).collect();
        assert_eq!(slugs, vec!["d1", "d3"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_discovered_links_truncated_to_quota() {
        let transport = MockTransport::new()
            .on("/all-locations", list_with_links(&["q1", "q2"]))
            .on("/job-offer/q", MockReply::ok("<title>Rust Dev - Acme</title>"));
        let client = SourceClient::new(transport.clone());
        let config = config().with_max_items(Some(1));
        let pipeline = FallbackPipeline::new(&client, &config);

        let kv = MemoryStore::new();
        let dataset = MemoryStore::new();
        let checkpoint = CheckpointStore::new(&kv);
        let mut ledger =
            RunLedger::new(&checkpoint, &dataset, CheckpointState::new(), config.max_items);

        let outcome = pipeline.run(&mut ledger).await.unwrap();

        assert_eq!(outcome.detail_pages, 1);
        assert_eq!(transport.request_count("/job-offer/q"), 1);
        assert_eq!(dataset.record_count(), 1);
        assert_eq!(dataset.records()[0].slug.as_deref(), Some("q1"));
    }
}
