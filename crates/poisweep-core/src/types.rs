//! Domain types shared across the poisweep workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::{self, GeoError};

/// A named geographic reference point used as the center of a radius search.
///
/// Immutable once constructed; owned by the caller (registry or manual
/// coordinates) and referenced by the aggregation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    /// Stable caller-supplied identifier (e.g. an IFSC code or `"manual-0"`).
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Anchor {
    /// Builds an anchor, rejecting out-of-range coordinates up front so a bad
    /// registry entry never reaches the provider.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::InvalidCoordinate`] if `latitude` is outside
    /// [-90, 90] or `longitude` is outside [-180, 180].
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) -> Result<Self, GeoError> {
        geo::validate(latitude, longitude)?;
        Ok(Self {
            id: id.into(),
            name: name.into(),
            latitude,
            longitude,
        })
    }
}

/// A normalized point-of-interest record with provenance.
///
/// `distance_km` is always computed internally from the source anchor and the
/// record's own coordinates, never trusted from the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoiRecord {
    pub name: String,
    pub address: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub rating: Option<f64>,
    pub review_count: u64,
    pub categories: Vec<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub external_link: Option<String>,
    pub distance_km: f64,
    /// Which anchor's search produced this record.
    pub source_anchor_id: String,
    pub search_query: String,
    pub retrieved_at: DateTime<Utc>,
}

/// Terminal state of one anchor within an aggregation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorStatus {
    /// The provider call succeeded and every returned entry normalized
    /// (including the zero-entry case).
    Success,
    /// The provider call succeeded but some entries were skipped during
    /// normalization.
    PartialSuccess,
    Failed,
    /// The aggregation was cancelled before this anchor ran.
    Cancelled,
}

impl std::fmt::Display for AnchorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnchorStatus::Success => write!(f, "success"),
            AnchorStatus::PartialSuccess => write!(f, "partial_success"),
            AnchorStatus::Failed => write!(f, "failed"),
            AnchorStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Per-anchor result of one aggregation pass; produced for every anchor
/// attempted, regardless of success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorOutcome {
    pub anchor_id: String,
    pub status: AnchorStatus,
    /// Count of records that made it into the merged set from this anchor.
    pub records_returned: usize,
    pub error_detail: Option<String>,
}

impl AnchorOutcome {
    #[must_use]
    pub fn success(anchor_id: impl Into<String>, records_returned: usize) -> Self {
        Self {
            anchor_id: anchor_id.into(),
            status: AnchorStatus::Success,
            records_returned,
            error_detail: None,
        }
    }

    #[must_use]
    pub fn failed(anchor_id: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            anchor_id: anchor_id.into(),
            status: AnchorStatus::Failed,
            records_returned: 0,
            error_detail: Some(detail.into()),
        }
    }

    #[must_use]
    pub fn cancelled(anchor_id: impl Into<String>) -> Self {
        Self {
            anchor_id: anchor_id.into(),
            status: AnchorStatus::Cancelled,
            records_returned: 0,
            error_detail: None,
        }
    }
}

/// One line in the session's append-only search history log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub query: String,
    pub anchor_ids: Vec<String>,
    pub total_records: usize,
    pub outcomes: Vec<AnchorOutcome>,
}

/// The current merged result of a search invocation.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    pub records: Vec<PoiRecord>,
    pub outcomes: Vec<AnchorOutcome>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchor_new_accepts_valid_coordinates() {
        let a = Anchor::new("SBIN0017040", "PANATHUR", 12.9382107, 77.6992385).unwrap();
        assert_eq!(a.id, "SBIN0017040");
        assert!((a.latitude - 12.9382107).abs() < f64::EPSILON);
    }

    #[test]
    fn anchor_new_rejects_out_of_range_latitude() {
        let err = Anchor::new("x", "bad", 91.0, 0.0).unwrap_err();
        assert!(matches!(err, GeoError::InvalidCoordinate { .. }));
    }

    #[test]
    fn anchor_new_rejects_out_of_range_longitude() {
        assert!(Anchor::new("x", "bad", 0.0, -180.5).is_err());
    }

    #[test]
    fn anchor_status_serializes_snake_case() {
        let s = serde_json::to_string(&AnchorStatus::PartialSuccess).unwrap();
        assert_eq!(s, "\"partial_success\"");
    }

    #[test]
    fn outcome_constructors_set_expected_fields() {
        let ok = AnchorOutcome::success("a", 3);
        assert_eq!(ok.status, AnchorStatus::Success);
        assert_eq!(ok.records_returned, 3);
        assert!(ok.error_detail.is_none());

        let failed = AnchorOutcome::failed("b", "timeout");
        assert_eq!(failed.status, AnchorStatus::Failed);
        assert_eq!(failed.records_returned, 0);
        assert_eq!(failed.error_detail.as_deref(), Some("timeout"));

        let cancelled = AnchorOutcome::cancelled("c");
        assert_eq!(cancelled.status, AnchorStatus::Cancelled);
    }
}
