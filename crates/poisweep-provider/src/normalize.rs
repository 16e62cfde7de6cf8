//! Normalization of loosely-typed provider payloads into canonical
//! [`PoiRecord`]s.
//!
//! The provider's JSON is duck-typed in the wild: numbers arrive as strings,
//! `types` may be an array, a scalar, or a stringified list, and half the
//! optional fields are simply absent. Everything here is a pure function:
//! the same raw payload always normalizes identically.

use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

use poisweep_core::{geo, Anchor, GeoError, PoiRecord};

/// Errors that reject a single record during normalization. The aggregator
/// counts these as skipped; they are never fatal for the anchor.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("record has no parseable {field}")]
    MissingCoordinate { field: &'static str },

    #[error(transparent)]
    InvalidCoordinate(#[from] GeoError),

    #[error("record is not a JSON object")]
    NotAnObject,
}

/// Coerces one raw provider entry into a [`PoiRecord`], computing the
/// great-circle distance from `anchor` and stamping provenance.
///
/// `retrieved_at` is passed in rather than read from the clock so the
/// function stays reproducible.
///
/// # Errors
///
/// Returns [`NormalizeError`] if the entry is not an object or lacks
/// in-range, parseable coordinates.
pub fn normalize(
    raw: &Value,
    anchor: &Anchor,
    query: &str,
    retrieved_at: DateTime<Utc>,
) -> Result<PoiRecord, NormalizeError> {
    let obj = raw.as_object().ok_or(NormalizeError::NotAnObject)?;

    let latitude = number_field(obj.get("latitude"))
        .ok_or(NormalizeError::MissingCoordinate { field: "latitude" })?;
    let longitude = number_field(obj.get("longitude"))
        .ok_or(NormalizeError::MissingCoordinate { field: "longitude" })?;
    geo::validate(latitude, longitude)?;

    let distance_km = geo::distance_km(anchor.latitude, anchor.longitude, latitude, longitude)?;

    let name = string_field(obj.get("name")).unwrap_or_else(|| "Unknown".to_string());
    let address = string_field(obj.get("full_address")).or_else(|| string_field(obj.get("address")));

    let rating = number_field(obj.get("rating")).filter(|r| (0.0..=5.0).contains(r));

    let review_count = obj
        .get("review_count")
        .or_else(|| obj.get("reviews_count"))
        .and_then(count_field)
        .unwrap_or(0);

    let categories = obj.get("types").map(parse_categories).unwrap_or_default();

    Ok(PoiRecord {
        name,
        address,
        latitude,
        longitude,
        rating,
        review_count,
        categories,
        phone: string_field(obj.get("phone_number")),
        website: string_field(obj.get("website")),
        external_link: string_field(obj.get("place_link")),
        distance_km,
        source_anchor_id: anchor.id.clone(),
        search_query: query.to_string(),
        retrieved_at,
    })
}

/// Non-empty string fields only; whitespace-only values count as absent.
fn string_field(value: Option<&Value>) -> Option<String> {
    let s = value?.as_str()?.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Accepts a JSON number or a numeric string.
fn number_field(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// Non-negative integer coercion for review counts; negatives clamp to 0.
fn count_field(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().map(|f| if f < 0.0 { 0 } else { f as u64 })),
        Value::String(s) => {
            let t = s.trim();
            t.parse::<u64>()
                .ok()
                .or_else(|| t.parse::<f64>().ok().map(|f| if f < 0.0 { 0 } else { f as u64 }))
        }
        _ => None,
    }
}

/// Normalizes the `types` field, which arrives in a closed set of shapes:
/// a native array, a scalar string, or a stringified list like
/// `"['bank','atm']"`. Unparseable text becomes a one-element list holding
/// the raw string, never silently dropped and never dynamically evaluated.
fn parse_categories(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => {
                    let t = s.trim();
                    (!t.is_empty()).then(|| t.to_string())
                }
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Value::String(s) => parse_category_text(s),
        Value::Null => Vec::new(),
        other => vec![other.to_string()],
    }
}

fn parse_category_text(s: &str) -> Vec<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    // A JSON-encoded array round-trips directly.
    if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(trimmed) {
        return parse_categories(&Value::Array(items));
    }

    // Python-style repr: ['bank', 'atm']. Split the bracket body and strip
    // matching quotes from each element.
    if trimmed.starts_with('[') && trimmed.ends_with(']') {
        let body = &trimmed[1..trimmed.len() - 1];
        let parts: Vec<String> = body
            .split(',')
            .map(|p| strip_quotes(p.trim()).to_string())
            .filter(|p| !p.is_empty())
            .collect();
        if parts.is_empty() {
            // Fallback: keep the raw text rather than dropping it.
            return if body.trim().is_empty() {
                Vec::new()
            } else {
                vec![trimmed.to_string()]
            };
        }
        return parts;
    }

    vec![trimmed.to_string()]
}

fn strip_quotes(s: &str) -> &str {
    let bytes = s.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'\'' && last == b'\'') || (first == b'"' && last == b'"') {
            return &s[1..s.len() - 1];
        }
    }
    s
}
