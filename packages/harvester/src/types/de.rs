//! Lenient serde helpers for upstream payloads whose shapes drift.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Treat an explicit `null` like a missing field.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept a string or a number and keep it as an opaque string token.
pub(crate) fn stringish<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_token(Option::<Value>::deserialize(deserializer)?))
}

pub(crate) fn value_to_token(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse an integer that may arrive as a number or a numeric string.
pub(crate) fn value_to_int(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_to_token() {
        assert_eq!(value_to_token(Some(json!("abc"))), Some("abc".to_string()));
        assert_eq!(value_to_token(Some(json!(42))), Some("42".to_string()));
        assert_eq!(value_to_token(Some(json!(""))), None);
        assert_eq!(value_to_token(Some(Value::Null)), None);
        assert_eq!(value_to_token(None), None);
    }

    #[test]
    fn test_value_to_int() {
        assert_eq!(value_to_int(Some(&json!(25))), Some(25));
        assert_eq!(value_to_int(Some(&json!(" 40 "))), Some(40));
        assert_eq!(value_to_int(Some(&json!("many"))), None);
        assert_eq!(value_to_int(None), None);
    }
}
