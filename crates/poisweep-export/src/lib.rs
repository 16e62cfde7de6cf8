//! Serialization of merged result sets to downloadable bytes.
//!
//! Columns are emitted in one fixed order regardless of which optional fields
//! a record carries; missing fields render as empty/null per format. CSV and
//! JSON are round-trip-safe: reparsing an export yields the input records
//! modulo type coercion (categories travel as a `|`-delimited string in CSV).

mod csv;
mod xlsx;

pub use csv::{parse_csv, write_csv};
pub use xlsx::write_xlsx;

use std::str::FromStr;

use thiserror::Error;

use poisweep_core::PoiRecord;

/// Fixed export column order shared by every format.
pub const COLUMNS: [&str; 14] = [
    "name",
    "address",
    "latitude",
    "longitude",
    "rating",
    "review_count",
    "categories",
    "phone",
    "website",
    "external_link",
    "distance_km",
    "source_anchor_id",
    "search_query",
    "retrieved_at",
];

/// Delimiter used to pack `categories` into a single CSV cell.
pub const CATEGORY_DELIMITER: char = '|';

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("unsupported export format: '{0}' (expected csv, json, or xlsx)")]
    UnsupportedFormat(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV parse error at line {line}: {reason}")]
    CsvParse { line: usize, reason: String },

    #[error("workbook write error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
    Xlsx,
}

impl ExportFormat {
    /// MIME type for the host to attach to a file download.
    #[must_use]
    pub fn mime(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Json => "application/json",
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }

    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Xlsx => "xlsx",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "xlsx" => Ok(ExportFormat::Xlsx),
            other => Err(ExportError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Serializes `records` to bytes in the requested format.
///
/// An empty record set is valid for every format (CSV yields a header-only
/// file).
///
/// # Errors
///
/// Returns [`ExportError`] on serialization failure; no partial output is
/// produced.
pub fn export(records: &[PoiRecord], format: ExportFormat) -> Result<Vec<u8>, ExportError> {
    match format {
        ExportFormat::Csv => Ok(write_csv(records)),
        ExportFormat::Json => {
            let mut bytes = serde_json::to_vec_pretty(records)?;
            bytes.push(b'\n');
            Ok(bytes)
        }
        ExportFormat::Xlsx => write_xlsx(records),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;

    pub(crate) fn sample_records() -> Vec<PoiRecord> {
        let at = DateTime::parse_from_rfc3339("2026-08-25T10:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        vec![
            PoiRecord {
                name: "Cafe \"Blue\", Bellandur".to_string(),
                address: Some("12, Outer Ring Road\nBellandur".to_string()),
                latitude: 12.9188658,
                longitude: 77.6700914,
                rating: Some(4.5),
                review_count: 120,
                categories: vec!["cafe".to_string(), "bakery".to_string()],
                phone: Some("+91-80-555-0100".to_string()),
                website: Some("https://example.com".to_string()),
                external_link: Some("https://maps.example.com/p/9".to_string()),
                distance_km: 1.25,
                source_anchor_id: "SBIN0015647".to_string(),
                search_query: "coffee".to_string(),
                retrieved_at: at,
            },
            PoiRecord {
                name: "Unknown".to_string(),
                address: None,
                latitude: 12.9382107,
                longitude: 77.6992385,
                rating: None,
                review_count: 0,
                categories: Vec::new(),
                phone: None,
                website: None,
                external_link: None,
                distance_km: 0.0,
                source_anchor_id: "SBIN0017040".to_string(),
                search_query: "coffee".to_string(),
                retrieved_at: at,
            },
        ]
    }

    #[test]
    fn format_tokens_parse_case_insensitively() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!(" json ".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!("xlsx".parse::<ExportFormat>().unwrap(), ExportFormat::Xlsx);
    }

    #[test]
    fn unknown_format_token_is_rejected() {
        let err = "parquet".parse::<ExportFormat>().unwrap_err();
        assert!(matches!(err, ExportError::UnsupportedFormat(ref t) if t == "parquet"));
    }

    #[test]
    fn mime_types_match_contract() {
        assert_eq!(ExportFormat::Csv.mime(), "text/csv");
        assert_eq!(ExportFormat::Json.mime(), "application/json");
        assert_eq!(
            ExportFormat::Xlsx.mime(),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
    }

    #[test]
    fn json_export_is_an_array_of_objects_and_round_trips() {
        let records = sample_records();
        let bytes = export(&records, ExportFormat::Json).unwrap();
        let parsed: Vec<PoiRecord> = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed, records, "field-for-field JSON round trip");
    }

    #[test]
    fn json_export_of_empty_set_is_empty_array() {
        let bytes = export(&[], ExportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value, serde_json::json!([]));
    }
}
