//! Cleanup of the inconsistent scalar encodings SWAPI uses.
//!
//! Numeric fields arrive as strings with thousands separators ("1,358") or as
//! placeholders ("unknown", "n/a"). Gender uses several spellings for "no
//! value". Everything here is pure and idempotent: feeding a canonical value
//! back in returns it unchanged.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serializer};
use serde_json::Value;

/// Canonical gender for missing or placeholder values.
pub const UNKNOWN_GENDER: &str = "unknown";

const NUMERIC_PLACEHOLDERS: &[&str] = &["unknown", "n/a"];
const GENDER_PLACEHOLDERS: &[&str] = &["none", "n/a", "unknown", "null"];

/// Display format for record timestamps, e.g. `9-12-2014 13:50:51`.
const DISPLAY_TIMESTAMP: &str = "%-d-%m-%Y %H:%M:%S";

/// Normalize a numeric field into its cleaned literal.
///
/// Returns `None` (the absent marker) for missing, blank, placeholder or
/// unparsable input. Real zeros stay `Some("0")`.
pub fn numeric(raw: Option<&str>) -> Option<String> {
  let trimmed = raw?.trim();
  if trimmed.is_empty() || is_placeholder(trimmed, NUMERIC_PLACEHOLDERS) {
    return None;
  }

  let cleaned = trimmed.replace(',', "");
  match cleaned.parse::<f64>() {
    Ok(value) if value.is_finite() => Some(cleaned),
    _ => None,
  }
}

/// Normalize a gender value. Placeholders collapse to [`UNKNOWN_GENDER`],
/// real values keep their casing.
pub fn gender(raw: Option<&str>) -> String {
  match raw.map(str::trim) {
    Some(value) if !value.is_empty() && !is_placeholder(value, GENDER_PLACEHOLDERS) => {
      value.to_string()
    }
    _ => UNKNOWN_GENDER.to_string(),
  }
}

/// Parse an RFC 3339 timestamp, `None` if missing or malformed.
pub fn timestamp(raw: Option<&str>) -> Option<DateTime<FixedOffset>> {
  DateTime::parse_from_rfc3339(raw?.trim()).ok()
}

/// Comparator helper: numeric value of a field, `0.0` when it has none.
pub fn numeric_or_zero(raw: Option<&str>) -> f64 {
  let Some(trimmed) = raw.map(str::trim) else {
    return 0.0;
  };
  if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("unknown") {
    return 0.0;
  }

  match trimmed.replace(',', "").parse::<f64>() {
    Ok(value) if value.is_finite() => value,
    _ => {
      tracing::debug!("Non-numeric value '{}', using 0", trimmed);
      0.0
    }
  }
}

fn is_placeholder(value: &str, placeholders: &[&str]) -> bool {
  placeholders.iter().any(|p| value.eq_ignore_ascii_case(p))
}

// ============================================================================
// serde adapters
// ============================================================================

/// Accepts strings, numbers and null; anything else counts as missing.
fn raw_scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Option::<Value>::deserialize(deserializer)?;
  Ok(match value {
    Some(Value::String(s)) => Some(s),
    Some(Value::Number(n)) => Some(n.to_string()),
    _ => None,
  })
}

pub fn deserialize_numeric<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(numeric(raw_scalar(deserializer)?.as_deref()))
}

pub fn deserialize_gender<'de, D>(deserializer: D) -> Result<String, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(gender(raw_scalar(deserializer)?.as_deref()))
}

pub fn deserialize_timestamp<'de, D>(
  deserializer: D,
) -> Result<Option<DateTime<FixedOffset>>, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(timestamp(raw_scalar(deserializer)?.as_deref()))
}

pub fn serialize_timestamp<S>(
  value: &Option<DateTime<FixedOffset>>,
  serializer: S,
) -> Result<S::Ok, S::Error>
where
  S: Serializer,
{
  match value {
    Some(ts) => serializer.collect_str(&ts.format(DISPLAY_TIMESTAMP)),
    None => serializer.serialize_none(),
  }
}
