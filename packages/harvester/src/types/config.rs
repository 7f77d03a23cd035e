//! Run input and the validated harvest configuration.

use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use super::de::value_to_int;

/// Largest page the listing endpoint serves per call.
pub const MAX_PAGE_SIZE: usize = 100;

/// Raw run input, in the actor `INPUT.json` shape.
///
/// Everything is optional and loosely typed; [`HarvestConfig::from_input`]
/// applies defaults and clamps.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HarvestInput {
    pub max_items: Option<Value>,
    pub max_pages: Option<Value>,
    pub page_size: Option<Value>,
    pub collect_details: Option<Value>,
    pub keywords: Option<String>,
    pub city: Option<String>,
    pub city_radius_km: Option<Value>,
    pub company_names: Option<OneOrMany>,
    pub skills: Option<OneOrMany>,
    pub job_titles: Option<OneOrMany>,
    pub workplace_types: Option<OneOrMany>,
    pub experience_levels: Option<OneOrMany>,
    pub employment_types: Option<OneOrMany>,
    pub currency: Option<String>,
    pub sort_by: Option<String>,
    pub order_by: Option<String>,
    pub start_urls: Vec<StartUrl>,
    pub proxy_configuration: Option<ProxyInput>,
}

impl HarvestInput {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// A filter given either as a single string or as a list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<Value>),
}

impl OneOrMany {
    /// Comma-joined non-empty values, or `None` when nothing is left.
    pub fn to_csv(&self) -> Option<String> {
        let items: Vec<String> = match self {
            OneOrMany::One(s) => vec![s.trim().to_string()],
            OneOrMany::Many(values) => values
                .iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s.trim().to_string()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect(),
        };
        let items: Vec<String> = items.into_iter().filter(|s| !s.is_empty()).collect();
        (!items.is_empty()).then(|| items.join(","))
    }
}

/// Start URLs may be plain strings or request objects with a `url`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StartUrl {
    Plain(String),
    Request { url: String },
}

impl StartUrl {
    pub fn url(&self) -> &str {
        match self {
            StartUrl::Plain(url) | StartUrl::Request { url } => url,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProxyInput {
    pub use_apify_proxy: bool,
    pub apify_proxy_groups: Vec<String>,
    pub apify_proxy_country: Option<String>,
    pub proxy_urls: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    #[default]
    Published,
    Oldest,
}

impl SortBy {
    /// `"oldest"` selects oldest-first; anything else means newest published.
    pub fn parse_lenient(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_lowercase()).as_deref() {
            Some("oldest") => SortBy::Oldest,
            _ => SortBy::Published,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::Published => "published",
            SortBy::Oldest => "oldest",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderBy {
    Asc,
    #[default]
    Desc,
}

impl OrderBy {
    pub fn parse_lenient(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().to_lowercase().starts_with("asc") => OrderBy::Asc,
            _ => OrderBy::Desc,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderBy::Asc => "ASC",
            OrderBy::Desc => "DESC",
        }
    }
}

/// Listing filters appended to every page request when present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OfferFilters {
    pub keywords: Option<String>,
    pub city: Option<String>,
    pub city_radius_km: Option<i64>,
    pub company_names: Option<String>,
    pub skills: Option<String>,
    pub job_titles: Option<String>,
    pub workplace_types: Option<String>,
    pub experience_levels: Option<String>,
    pub employment_types: Option<String>,
    pub currency: Option<String>,
}

impl OfferFilters {
    /// Query parameters in request order, skipping absent filters.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        let mut push = |name: &'static str, value: &Option<String>| {
            if let Some(v) = value {
                pairs.push((name, v.clone()));
            }
        };
        push("keywords", &self.keywords);
        push("companyNames", &self.company_names);
        push("skills", &self.skills);
        push("jobTitles", &self.job_titles);
        push("city", &self.city);
        if self.city.is_some() {
            push("cityRadiusKm", &self.city_radius_km.map(|r| r.to_string()));
        }
        push("workplaceTypes", &self.workplace_types);
        push("experienceLevels", &self.experience_levels);
        push("employmentTypes", &self.employment_types);
        push("currency", &self.currency);
        pairs
    }
}

/// Randomized pause bounds between requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PauseRange {
    pub min: Duration,
    pub max: Duration,
}

impl PauseRange {
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min: Duration::from_millis(min_ms),
            max: Duration::from_millis(max_ms),
        }
    }

    pub const fn none() -> Self {
        Self::new(0, 0)
    }
}

impl Default for PauseRange {
    fn default() -> Self {
        Self::new(150, 400)
    }
}

/// Endpoints of the source site. Overridable so tests can point at a mock transport.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceEndpoints {
    pub listing_api: String,
    pub detail_api: String,
    pub site_origin: String,
    pub default_list_url: String,
    pub sitemap_url: String,
}

impl Default for SourceEndpoints {
    fn default() -> Self {
        Self {
            listing_api: "https://api.justjoin.it/v2/user-panel/offers/by-cursor".to_string(),
            detail_api: "https://justjoin.it/api/candidate-api/offers".to_string(),
            site_origin: "https://justjoin.it".to_string(),
            default_list_url: "https://justjoin.it/job-offer/all-locations".to_string(),
            sitemap_url: "https://justjoin.it/sitemap.xml".to_string(),
        }
    }
}

impl SourceEndpoints {
    /// Everything rooted at one origin, e.g. `http://mock.test`.
    pub fn rooted_at(origin: &str) -> Self {
        let origin = origin.trim_end_matches('/');
        Self {
            listing_api: format!("{}/v2/user-panel/offers/by-cursor", origin),
            detail_api: format!("{}/api/candidate-api/offers", origin),
            site_origin: origin.to_string(),
            default_list_url: format!("{}/job-offer/all-locations", origin),
            sitemap_url: format!("{}/sitemap.xml", origin),
        }
    }

    /// Canonical public URL of an offer.
    pub fn offer_url(&self, slug: &str) -> String {
        format!("{}/job-offer/{}", self.site_origin, slug)
    }

    pub fn detail_url(&self, slug: &str) -> String {
        format!("{}/{}", self.detail_api, slug)
    }
}

/// Validated harvest configuration.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Stop after this many accepted records; `None` is unlimited
    pub max_items: Option<u64>,
    pub max_pages: u32,
    pub page_size: usize,
    /// Fetch the detail record of every offer
    pub collect_details: bool,
    pub filters: OfferFilters,
    pub sort_by: SortBy,
    pub order_by: OrderBy,
    /// List pages for the HTML fallback
    pub start_urls: Vec<String>,
    /// Worker pool width for detail fetches
    pub concurrency: usize,
    pub pause: PauseRange,
    /// Flush the checkpoint every N acceptances
    pub flush_every: u64,
    pub endpoints: SourceEndpoints,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            max_items: Some(100),
            max_pages: 10,
            page_size: MAX_PAGE_SIZE,
            collect_details: true,
            filters: OfferFilters::default(),
            sort_by: SortBy::default(),
            order_by: OrderBy::default(),
            start_urls: Vec::new(),
            concurrency: 10,
            pause: PauseRange::default(),
            flush_every: 25,
            endpoints: SourceEndpoints::default(),
        }
    }
}

impl HarvestConfig {
    /// Apply defaults and clamps to raw input.
    pub fn from_input(input: &HarvestInput) -> Self {
        let defaults = Self::default();

        let max_items = match value_to_int(input.max_items.as_ref()) {
            Some(n) if n > 0 => Some(n as u64),
            Some(_) => None,
            None => defaults.max_items,
        };
        let max_pages = value_to_int(input.max_pages.as_ref())
            .unwrap_or(defaults.max_pages as i64)
            .clamp(1, u32::MAX as i64) as u32;
        let page_size = value_to_int(input.page_size.as_ref())
            .unwrap_or(MAX_PAGE_SIZE as i64)
            .clamp(1, MAX_PAGE_SIZE as i64) as usize;
        let collect_details = !matches!(input.collect_details, Some(Value::Bool(false)));

        let city = non_empty(input.city.as_deref());
        let city_radius_km = value_to_int(input.city_radius_km.as_ref())
            .or_else(|| city.as_ref().map(|_| 30));

        let filters = OfferFilters {
            keywords: non_empty(input.keywords.as_deref()),
            city,
            city_radius_km,
            company_names: input.company_names.as_ref().and_then(OneOrMany::to_csv),
            skills: input.skills.as_ref().and_then(OneOrMany::to_csv),
            job_titles: input.job_titles.as_ref().and_then(OneOrMany::to_csv),
            workplace_types: input.workplace_types.as_ref().and_then(OneOrMany::to_csv),
            experience_levels: input.experience_levels.as_ref().and_then(OneOrMany::to_csv),
            employment_types: input.employment_types.as_ref().and_then(OneOrMany::to_csv),
            currency: non_empty(input.currency.as_deref()),
        };

        Self {
            max_items,
            max_pages,
            page_size,
            collect_details,
            filters,
            sort_by: SortBy::parse_lenient(input.sort_by.as_deref()),
            order_by: OrderBy::parse_lenient(input.order_by.as_deref()),
            start_urls: input
                .start_urls
                .iter()
                .map(|s| s.url().trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            ..defaults
        }
    }

    pub fn with_max_items(mut self, max_items: Option<u64>) -> Self {
        self.max_items = max_items;
        self
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn with_collect_details(mut self, collect_details: bool) -> Self {
        self.collect_details = collect_details;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_pause(mut self, pause: PauseRange) -> Self {
        self.pause = pause;
        self
    }

    pub fn with_start_urls(mut self, urls: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.start_urls = urls.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_endpoints(mut self, endpoints: SourceEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
