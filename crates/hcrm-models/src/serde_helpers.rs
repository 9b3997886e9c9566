//! Lenient deserializers for loosely-typed API payloads.
//!
//! The CRM backend is inconsistent about scalar types: identifiers arrive as
//! numbers or strings, counts occasionally as numeric strings, and dates in
//! several formats. Every helper here maps `null`, missing and unparsable
//! values to `None` so the record constructors can apply their defaults.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Identifier that may be a JSON number or string.
pub fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }))
}

/// String field that tolerates numbers (phone numbers, postcodes).
pub fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }))
}

/// Floating point field that tolerates numeric strings.
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }))
}

/// Non-negative integer field that tolerates numeric strings and floats.
pub fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }))
}

/// Same as [`lenient_u64`], narrowed to `u32`.
pub fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_u64(deserializer)?.and_then(|n| u32::try_from(n).ok()))
}

/// Boolean flag; accepts `true`/`false`, 0/1 and "true"/"yes"/"1".
pub fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Bool(b) => Some(b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }))
}

/// List of strings; scalars inside the array are stringified, a bare string
/// becomes a one-element list.
pub fn lenient_string_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect(),
        ),
        Value::String(s) if !s.is_empty() => Some(vec![s]),
        _ => None,
    }))
}

/// Timestamp in RFC 3339, naive ISO-8601, plain date, or epoch milliseconds.
pub fn lenient_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::String(s) => parse_datetime(&s),
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    }))
}

/// Parse the date formats the CRM backend is known to emit.
pub fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Treat empty strings as missing, mirroring how the dashboard falls back.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "lenient_id")]
        id: Option<String>,
        #[serde(default, deserialize_with = "lenient_u32")]
        count: Option<u32>,
        #[serde(default, deserialize_with = "lenient_bool")]
        flag: Option<bool>,
        #[serde(default, deserialize_with = "lenient_datetime")]
        at: Option<DateTime<Utc>>,
        #[serde(default, deserialize_with = "lenient_string_list")]
        tags: Option<Vec<String>>,
    }

    #[test]
    fn test_numeric_id_becomes_string() {
        let p: Probe = serde_json::from_str(r#"{"id": 42}"#).unwrap();
        assert_eq!(p.id.as_deref(), Some("42"));
    }

    #[test]
    fn test_missing_and_null_fields_are_none() {
        let p: Probe = serde_json::from_str(r#"{"id": null, "count": null}"#).unwrap();
        assert!(p.id.is_none());
        assert!(p.count.is_none());
        assert!(p.flag.is_none());
        assert!(p.at.is_none());
        assert!(p.tags.is_none());
    }

    #[test]
    fn test_numeric_strings_are_accepted() {
        let p: Probe = serde_json::from_str(r#"{"count": "12", "flag": "yes"}"#).unwrap();
        assert_eq!(p.count, Some(12));
        assert_eq!(p.flag, Some(true));
    }

    #[test]
    fn test_unparsable_values_degrade_to_none() {
        let p: Probe =
            serde_json::from_str(r#"{"count": "lots", "at": "next tuesday", "flag": {}}"#).unwrap();
        assert!(p.count.is_none());
        assert!(p.at.is_none());
        assert!(p.flag.is_none());
    }

    #[test]
    fn test_date_formats() {
        assert!(parse_datetime("2024-03-01T10:00:00Z").is_some());
        assert!(parse_datetime("2024-03-01T10:00:00.123").is_some());
        let d = parse_datetime("2024-03-01").unwrap();
        assert_eq!((d.year(), d.month(), d.day()), (2024, 3, 1));
        assert!(parse_datetime("").is_none());
    }

    #[test]
    fn test_epoch_millis_timestamp() {
        let p: Probe = serde_json::from_str(r#"{"at": 1700000000000}"#).unwrap();
        assert_eq!(p.at.unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_string_list_mixed_items() {
        let p: Probe = serde_json::from_str(r#"{"tags": ["wifi", 3, null]}"#).unwrap();
        assert_eq!(p.tags.unwrap(), vec!["wifi".to_string(), "3".to_string()]);
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some("  ".into())), None);
        assert_eq!(non_empty(Some("x".into())), Some("x".into()));
        assert_eq!(non_empty(None), None);
    }
}
