//! Extraction from raw site markup for the HTML fallback.
//!
//! Detail links on a list page come from an ordered list of
//! [`LinkStrategy`]s; the first one that yields anything wins. Malformed
//! markup or JSON-LD never fails: it just yields nothing.

use indexmap::IndexSet;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use std::sync::LazyLock;
use url::Url;

/// How detail links are found on a list page, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStrategy {
    /// JSON-LD `CollectionPage.hasPart[].url`
    StructuredData,
    /// `a[href]` pointing at an offer page
    Anchors,
    /// Offer URLs listed in the sitemap (first list page only)
    Sitemap,
}

impl LinkStrategy {
    pub const ORDER: [LinkStrategy; 3] = [
        LinkStrategy::StructuredData,
        LinkStrategy::Anchors,
        LinkStrategy::Sitemap,
    ];
}

static SITEMAP_OFFER_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)https?://justjoin\.it/job-offer/[^\s"<]+"#).unwrap()
});

static OFFER_PATH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)/job-offer/").unwrap());

/// All parseable JSON-LD objects on the page, flattening top-level arrays.
fn json_ld_items(html: &str) -> Vec<Value> {
    let Ok(selector) = Selector::parse(r#"script[type="application/ld+json"]"#) else {
        return vec![];
    };
    let document = Html::parse_document(html);

    let mut items = Vec::new();
    for script in document.select(&selector) {
        let raw: String = script.text().collect();
        let Ok(parsed) = serde_json::from_str::<Value>(raw.trim()) else {
            continue;
        };
        match parsed {
            Value::Array(list) => items.extend(list),
            other => items.push(other),
        }
    }
    items
}

fn has_type(item: &Value, wanted: &str) -> bool {
    match item.get("@type").or_else(|| item.get("type")) {
        Some(Value::String(t)) => t == wanted,
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some(wanted)),
        _ => false,
    }
}

/// Offer URLs declared by JSON-LD `CollectionPage` blocks, deduplicated in order.
pub fn structured_data_links(html: &str) -> Vec<String> {
    let mut urls = IndexSet::new();
    for item in json_ld_items(html) {
        if !has_type(&item, "CollectionPage") {
            continue;
        }
        let Some(parts) = item.get("hasPart").and_then(Value::as_array) else {
            continue;
        };
        for part in parts {
            if let Some(url) = part.get("url").and_then(Value::as_str).filter(|u| !u.is_empty()) {
                urls.insert(url.to_string());
            }
        }
    }
    urls.into_iter().collect()
}

/// Absolute offer URLs from anchors, resolved against `origin`.
pub fn anchor_links(html: &str, origin: &Url) -> Vec<String> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return vec![];
    };
    let document = Html::parse_document(html);

    let urls: IndexSet<String> = document
        .select(&selector)
        .filter_map(|el| el.value().attr("href"))
        .filter(|href| OFFER_PATH.is_match(href))
        .filter_map(|href| origin.join(href).ok())
        .map(String::from)
        .collect();
    urls.into_iter().collect()
}

/// Offer URLs found anywhere in a sitemap body.
pub fn sitemap_links(body: &str) -> Vec<String> {
    let urls: IndexSet<&str> = SITEMAP_OFFER_URL
        .find_iter(body)
        .map(|m| m.as_str())
        .collect();
    urls.into_iter().map(str::to_string).collect()
}

/// The first JSON-LD `JobPosting` object on a detail page.
pub fn job_posting(html: &str) -> Option<Value> {
    json_ld_items(html)
        .into_iter()
        .find(|item| has_type(item, "JobPosting"))
}

/// Trimmed text of the document's first `<title>`.
pub fn page_title(html: &str) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    let document = Html::parse_document(html);
    let title: String = document.select(&selector).next()?.text().collect();
    let title = title.trim();
    (!title.is_empty()).then(|| title.to_string())
}

/// Last non-empty path segment of `url`.
pub fn slug_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .path_segments()?
        .filter(|s| !s.is_empty())
        .last()
        .map(str::to_string)
}
