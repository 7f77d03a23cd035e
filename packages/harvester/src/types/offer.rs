//! The canonical offer record emitted by both pipelines.

use serde::{Deserialize, Serialize};
use serde_json::Number;

/// Constant `source` tag on every record.
pub const SOURCE_TAG: &str = "justjoin.it";

/// One normalized job offer.
///
/// Records from the HTML fallback carry the same schema with most structured
/// fields left `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferRecord {
    pub id: Option<String>,
    pub slug: Option<String>,
    pub title: Option<String>,
    pub company: Option<String>,
    pub company_url: Option<String>,
    pub company_logo: Option<String>,
    pub category: Option<String>,
    pub workplace_type: Option<String>,
    pub working_time: Option<String>,
    pub experience: Option<String>,
    pub location: Option<String>,
    pub street: Option<String>,
    pub country_code: Option<String>,
    pub locations: Option<Vec<OfferLocation>>,
    pub employment_types: Option<Vec<EmploymentType>>,
    pub salary: Option<String>,
    pub skills: Option<Vec<String>>,
    pub nice_to_have_skills: Option<Vec<String>>,
    pub languages: Option<Vec<OfferLanguage>>,
    pub is_remote_interview: Option<bool>,
    pub is_open_to_hire_ukrainians: Option<bool>,
    pub apply_url: Option<String>,
    pub date_posted: Option<String>,
    pub last_published_at: Option<String>,
    pub expired_at: Option<String>,
    pub description_html: Option<String>,
    pub description_text: Option<String>,
    pub url: Option<String>,
    pub source: String,
}

impl Default for OfferRecord {
    fn default() -> Self {
        Self {
            id: None,
            slug: None,
            title: None,
            company: None,
            company_url: None,
            company_logo: None,
            category: None,
            workplace_type: None,
            working_time: None,
            experience: None,
            location: None,
            street: None,
            country_code: None,
            locations: None,
            employment_types: None,
            salary: None,
            skills: None,
            nice_to_have_skills: None,
            languages: None,
            is_remote_interview: None,
            is_open_to_hire_ukrainians: None,
            apply_url: None,
            date_posted: None,
            last_published_at: None,
            expired_at: None,
            description_html: None,
            description_text: None,
            url: None,
            source: SOURCE_TAG.to_string(),
        }
    }
}

impl OfferRecord {
    /// A record that only knows where the offer lives.
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Default::default()
        }
    }

    /// Key used for deduplication: slug, else url.
    ///
    /// `None` means the record can't be deduplicated and is always treated as new.
    pub fn dedup_key(&self) -> Option<&str> {
        self.slug
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.url.as_deref().filter(|u| !u.is_empty()))
    }
}

/// One employment form with its salary band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmploymentType {
    #[serde(rename = "type")]
    pub kind: String,
    pub salary_from: Option<Number>,
    pub salary_to: Option<Number>,
    pub currency: Option<String>,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferLocation {
    pub city: Option<String>,
    pub street: Option<String>,
    pub country_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferLanguage {
    pub code: Option<String>,
    pub level: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_key_prefers_slug() {
        let record = OfferRecord {
            slug: Some("acme-rust".into()),
            url: Some("https://justjoin.it/job-offer/acme-rust".into()),
            ..Default::default()
        };
        assert_eq!(record.dedup_key(), Some("acme-rust"));

        let url_only = OfferRecord::from_url("https://justjoin.it/job-offer/x");
        assert_eq!(url_only.dedup_key(), Some("https://justjoin.it/job-offer/x"));

        assert_eq!(OfferRecord::default().dedup_key(), None);
    }

    #[test]
    fn test_serializes_nulls_and_source() {
        let value = serde_json::to_value(OfferRecord::from_url("https://justjoin.it/job-offer/x")).unwrap();

        assert_eq!(value["source"], "justjoin.it");
        assert!(value["title"].is_null());
        assert!(value.as_object().unwrap().contains_key("salary"));
    }
}
