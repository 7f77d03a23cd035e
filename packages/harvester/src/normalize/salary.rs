//! Human-readable salary summaries.

use serde_json::Number;

use crate::types::ApiEmploymentType;

/// Summarize an employment-type list as e.g. `"5000 - 9000 PLN / month"`.
///
/// Uses the entry quoted in its original currency when there is one, else
/// the first entry. Returns `None` when that entry carries no figures.
pub fn summarize_salary(types: &[ApiEmploymentType]) -> Option<String> {
    let entry = types
        .iter()
        .find(|t| t.is_original_currency())
        .or_else(|| types.first())?;

    format_salary(
        entry.salary_from(),
        entry.salary_to(),
        entry.currency.as_deref(),
        entry.unit.as_deref(),
    )
}

/// Format a salary band from its parts.
pub fn format_salary(
    from: Option<&Number>,
    to: Option<&Number>,
    currency: Option<&str>,
    unit: Option<&str>,
) -> Option<String> {
    let range = match (from, to) {
        (None, None) => return None,
        (Some(from), Some(to)) => format!("{} - {}", display_number(from), display_number(to)),
        (Some(one), None) | (None, Some(one)) => display_number(one),
    };

    let mut out = range;
    if let Some(currency) = currency.map(str::trim).filter(|c| !c.is_empty()) {
        out.push(' ');
        out.push_str(&currency.to_uppercase());
    }
    if let Some(unit) = unit.map(str::trim).filter(|u| !u.is_empty()) {
        out.push_str(" / ");
        out.push_str(&unit.to_lowercase());
    }
    Some(out.trim().to_string())
}

/// Whole floats print without a fractional part (`5000.0` -> `5000`).
fn display_number(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if !n.is_i64() && !n.is_u64() && f.fract() == 0.0 && f.abs() < 1e15 => {
            format!("{}", f as i64)
        }
        _ => n.to_string(),
    }
}
