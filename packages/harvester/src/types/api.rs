//! Wire types for the justjoin.it offer API.
//!
//! The cursor listing endpoint and the candidate detail endpoint return the
//! same offer shape with different subsets filled in, so both deserialize
//! into [`ApiOffer`]. Every field is optional; a field the source stops
//! sending degrades to `None` instead of failing the page.

use serde::Deserialize;
use serde_json::{Number, Value};

use super::de::{nullable, stringish, value_to_token};

/// One page from the cursor listing endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OffersPage {
    #[serde(default, deserialize_with = "nullable")]
    pub data: Vec<ApiOffer>,

    #[serde(default)]
    pub meta: Option<PageMeta>,
}

impl OffersPage {
    /// Continuation token for the next page. `None` means end of sequence.
    pub fn next_cursor(&self) -> Option<String> {
        self.meta
            .as_ref()
            .and_then(|m| m.next.as_ref())
            .and_then(|n| value_to_token(n.cursor.clone()))
    }

    pub fn total_items(&self) -> Option<u64> {
        self.meta.as_ref().and_then(|m| m.total_items)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total_items: Option<u64>,
    pub next: Option<NextPage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NextPage {
    pub cursor: Option<Value>,
}

/// A listing summary or a detail record.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiOffer {
    #[serde(deserialize_with = "stringish")]
    pub id: Option<String>,
    #[serde(deserialize_with = "stringish")]
    pub guid: Option<String>,
    pub slug: Option<String>,
    pub title: Option<String>,
    pub company_name: Option<String>,
    pub company_url: Option<String>,
    pub company_logo_url: Option<String>,
    pub company_logo_thumb_url: Option<String>,
    pub category: Option<CategoryRef>,
    pub workplace_type: Option<String>,
    pub working_time: Option<String>,
    pub experience_level: Option<String>,
    pub city: Option<String>,
    pub street: Option<String>,
    pub country_code: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub locations: Vec<ApiLocation>,
    #[serde(deserialize_with = "nullable")]
    pub employment_types: Vec<ApiEmploymentType>,
    #[serde(deserialize_with = "nullable")]
    pub required_skills: Vec<SkillEntry>,
    #[serde(deserialize_with = "nullable")]
    pub nice_to_have_skills: Vec<SkillEntry>,
    #[serde(deserialize_with = "nullable")]
    pub languages: Vec<ApiLanguage>,
    pub is_remote_interview: Option<bool>,
    pub is_open_to_hire_ukrainians: Option<bool>,
    pub apply_url: Option<String>,
    pub published_at: Option<String>,
    pub last_published_at: Option<String>,
    pub expired_at: Option<String>,
    /// Full description markup (detail endpoint only)
    pub body: Option<String>,
}

/// Category is an object with a `key` on current payloads, a bare string on older ones.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CategoryRef {
    Plain(String),
    Keyed { key: Option<String> },
}

impl CategoryRef {
    pub fn key(&self) -> Option<&str> {
        match self {
            CategoryRef::Plain(s) => Some(s.as_str()),
            CategoryRef::Keyed { key } => key.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiLocation {
    pub city: Option<String>,
    pub street: Option<String>,
    pub country_code: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiEmploymentType {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub from: Option<Number>,
    pub to: Option<Number>,
    pub from_per_unit: Option<Number>,
    pub to_per_unit: Option<Number>,
    pub currency: Option<String>,
    /// `"original"` marks the figures as posted; other values are conversions
    pub currency_source: Option<String>,
    pub unit: Option<String>,
    pub gross: Option<bool>,
}

impl ApiEmploymentType {
    /// Lower bound, preferring the per-unit figure.
    pub fn salary_from(&self) -> Option<&Number> {
        self.from_per_unit.as_ref().or(self.from.as_ref())
    }

    /// Upper bound, preferring the per-unit figure.
    pub fn salary_to(&self) -> Option<&Number> {
        self.to_per_unit.as_ref().or(self.to.as_ref())
    }

    pub fn is_original_currency(&self) -> bool {
        self.currency_source
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("original"))
    }
}

/// Skills arrive either as plain strings or as `{ "name": ..., "level": ... }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SkillEntry {
    Name(String),
    Labeled { name: Option<String> },
    Other(Value),
}

impl SkillEntry {
    pub fn name(&self) -> Option<&str> {
        let name = match self {
            SkillEntry::Name(s) => s.as_str(),
            SkillEntry::Labeled { name } => name.as_deref()?,
            SkillEntry::Other(_) => return None,
        };
        let name = name.trim();
        (!name.is_empty()).then_some(name)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiLanguage {
    pub code: Option<String>,
    pub level: Option<String>,
}
