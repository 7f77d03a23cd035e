//! Mapping of source payloads onto [`OfferRecord`].
//!
//! [`normalize`] merges a listing summary with its optional detail payload.
//! Every overlapping field prefers the detail value and falls back to the
//! summary; empty strings count as absent.

pub mod salary;
pub mod sanitize;

pub use salary::{format_salary, summarize_salary};
pub use sanitize::{clean_text, sanitize_html};

use crate::types::api::{ApiLanguage, ApiLocation, SkillEntry};
use crate::types::{
    ApiEmploymentType, ApiOffer, EmploymentType, OfferLanguage, OfferLocation, OfferRecord,
    SourceEndpoints,
};

/// At most this many employment types are kept per record.
pub const MAX_EMPLOYMENT_TYPES: usize = 3;

/// Build a canonical record from a listing summary and optional detail.
pub fn normalize(
    summary: &ApiOffer,
    detail: Option<&ApiOffer>,
    endpoints: &SourceEndpoints,
) -> OfferRecord {
    let text = |field: fn(&ApiOffer) -> Option<&String>| -> Option<String> {
        detail
            .and_then(|d| non_empty(field(d)))
            .or_else(|| non_empty(field(summary)))
    };
    let flag = |field: fn(&ApiOffer) -> Option<bool>| detail.and_then(field).or_else(|| field(summary));

    let slug = text(|o| o.slug.as_ref());
    let employment = richer(
        detail.map(|d| d.employment_types.as_slice()),
        &summary.employment_types,
    );
    let locations = first_non_empty(detail.map(|d| d.locations.as_slice()), &summary.locations);
    let languages = first_non_empty(detail.map(|d| d.languages.as_slice()), &summary.languages);
    let body = text(|o| o.body.as_ref());
    let description_html = body.as_deref().and_then(sanitize_html);
    let description_text = description_html
        .as_deref()
        .or(body.as_deref())
        .and_then(clean_text);

    OfferRecord {
        id: detail
            .and_then(|d| non_empty(d.id.as_ref()))
            .or_else(|| non_empty(summary.guid.as_ref()))
            .or_else(|| non_empty(summary.id.as_ref())),
        title: text(|o| o.title.as_ref()),
        company: text(|o| o.company_name.as_ref()),
        company_url: text(|o| o.company_url.as_ref()),
        company_logo: text(|o| o.company_logo_url.as_ref())
            .or_else(|| non_empty(summary.company_logo_thumb_url.as_ref())),
        category: detail
            .and_then(category_key)
            .or_else(|| category_key(summary)),
        workplace_type: text(|o| o.workplace_type.as_ref()),
        working_time: text(|o| o.working_time.as_ref()),
        experience: text(|o| o.experience_level.as_ref()),
        location: text(|o| o.city.as_ref()).or_else(|| {
            locations
                .and_then(|l| l.first())
                .and_then(|l| non_empty(l.city.as_ref()))
        }),
        street: text(|o| o.street.as_ref()),
        country_code: text(|o| o.country_code.as_ref()),
        locations: locations.map(|l| l.iter().map(map_location).collect()),
        employment_types: map_employment_types(employment),
        salary: summarize_salary(employment),
        skills: map_skills(first_non_empty(
            detail.map(|d| d.required_skills.as_slice()),
            &summary.required_skills,
        )),
        nice_to_have_skills: map_skills(first_non_empty(
            detail.map(|d| d.nice_to_have_skills.as_slice()),
            &summary.nice_to_have_skills,
        )),
        languages: languages.map(|l| l.iter().map(map_language).collect()),
        is_remote_interview: flag(|o| o.is_remote_interview),
        is_open_to_hire_ukrainians: flag(|o| o.is_open_to_hire_ukrainians),
        apply_url: text(|o| o.apply_url.as_ref()),
        date_posted: text(|o| o.published_at.as_ref()),
        last_published_at: text(|o| o.last_published_at.as_ref()),
        expired_at: text(|o| o.expired_at.as_ref()),
        description_html,
        description_text,
        url: slug.as_deref().map(|s| endpoints.offer_url(s)),
        slug,
        ..Default::default()
    }
}

/// The longer of the two lists; the detail list wins ties.
fn richer<'a, T>(detail: Option<&'a [T]>, summary: &'a [T]) -> &'a [T] {
    match detail {
        Some(d) if !d.is_empty() && d.len() >= summary.len() => d,
        _ => summary,
    }
}

fn first_non_empty<'a, T>(detail: Option<&'a [T]>, summary: &'a [T]) -> Option<&'a [T]> {
    detail
        .filter(|d| !d.is_empty())
        .or_else(|| (!summary.is_empty()).then_some(summary))
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty()).cloned()
}

fn category_key(offer: &ApiOffer) -> Option<String> {
    offer
        .category
        .as_ref()
        .and_then(|c| c.key())
        .filter(|k| !k.is_empty())
        .map(str::to_string)
}

/// Employment types with a `type`, capped; `None` if none qualify.
pub fn map_employment_types(types: &[ApiEmploymentType]) -> Option<Vec<EmploymentType>> {
    let mapped: Vec<EmploymentType> = types
        .iter()
        .filter_map(|t| {
            let kind = t.kind.as_deref().map(str::trim).filter(|k| !k.is_empty())?;
            Some(EmploymentType {
                kind: kind.to_string(),
                salary_from: t.salary_from().cloned(),
                salary_to: t.salary_to().cloned(),
                currency: t.currency.clone(),
                unit: t.unit.clone(),
            })
        })
        .take(MAX_EMPLOYMENT_TYPES)
        .collect();
    (!mapped.is_empty()).then_some(mapped)
}

/// Skill names in order; `None` if nothing usable remains.
pub fn map_skills(skills: Option<&[SkillEntry]>) -> Option<Vec<String>> {
    let names: Vec<String> = skills?
        .iter()
        .filter_map(|s| s.name())
        .map(str::to_string)
        .collect();
    (!names.is_empty()).then_some(names)
}

fn map_location(location: &ApiLocation) -> OfferLocation {
    OfferLocation {
        city: location.city.clone(),
        street: location.street.clone(),
        country_code: location.country_code.clone(),
    }
}

fn map_language(language: &ApiLanguage) -> OfferLanguage {
    OfferLanguage {
        code: language.code.clone(),
        level: language.level.clone(),
    }
}
