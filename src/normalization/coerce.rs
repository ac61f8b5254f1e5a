//! Shared feed-value coercion. Suppliers disagree about value types as much as
//! about key casing: numbers arrive as strings, flags as 0/1, timestamps in
//! several shapes. Everything here degrades to None instead of failing.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

/// Raw payloads above this size are not persisted; truncating JSON mid-stream
/// would store garbage.
pub const MAX_RAW_DATA_BYTES: usize = 64 * 1024;

/// Numeric coercion accepting JSON numbers and numeric strings.
pub fn to_f64(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// Integer coercion; fractional numeric input is rounded, not rejected.
pub fn to_i64(value: Option<&Value>) -> Option<i64> {
    to_f64(value).map(|f| f.round() as i64)
}

/// String coercion: trims, treats empty as absent, renders bare numbers.
pub fn to_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => non_empty(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Loose boolean coercion for supplier flag fields.
pub fn to_bool(value: Option<&Value>) -> Option<bool> {
    match value? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|i| i != 0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Some(true),
            "0" | "false" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Timestamp coercion over the date shapes the feeds have been seen to emit.
/// Unparseable or absent input is None, never an error.
pub fn to_datetime(value: Option<&Value>) -> Option<DateTime<Utc>> {
    match value? {
        Value::String(s) => parse_datetime_str(s),
        Value::Number(n) => {
            let raw = n.as_i64()?;
            // Heuristic: beyond ~2100 as seconds, treat as milliseconds.
            if raw.abs() >= 4_102_444_800 {
                DateTime::<Utc>::from_timestamp_millis(raw)
            } else {
                DateTime::<Utc>::from_timestamp(raw, 0)
            }
        }
        _ => None,
    }
}

pub fn parse_datetime_str(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|n| n.and_utc());
    }
    None
}

/// Trimmed, empty-as-None string.
pub fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Fixed-width destination columns: truncate over-long values, marking the cut
/// with an ellipsis so readers can tell the value is partial.
pub fn truncate_with_ellipsis(input: &str, max_chars: usize) -> String {
    if input.chars().count() <= max_chars {
        return input.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = input.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// Serialized original payload, or None when it exceeds the persistence cap.
pub fn raw_json_capped(raw: &Value) -> Option<String> {
    let serialized = serde_json::to_string(raw).ok()?;
    if serialized.len() > MAX_RAW_DATA_BYTES {
        tracing::debug!(size = serialized.len(), "raw payload over cap; not persisted");
        return None;
    }
    Some(serialized)
}
