//! Session-scoped result holder.
//!
//! Exactly one result set is "current" at a time; replacing it never touches
//! the history log, which is append-only for the lifetime of the session.
//! Aggregation workers never write here; the completion step installs the
//! merged result in one call, so the store needs no internal locking.

use chrono::Utc;

use poisweep_core::{Anchor, AnchorOutcome, PoiRecord, ResultSet, SearchHistoryEntry};

#[derive(Debug, Default)]
pub struct ResultStore {
    current: Option<ResultSet>,
    history: Vec<SearchHistoryEntry>,
}

impl ResultStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the current result set and appends one history entry.
    pub fn set_current(
        &mut self,
        records: Vec<PoiRecord>,
        outcomes: Vec<AnchorOutcome>,
        entry: SearchHistoryEntry,
    ) {
        self.history.push(entry);
        self.current = Some(ResultSet { records, outcomes });
    }

    #[must_use]
    pub fn current(&self) -> Option<&ResultSet> {
        self.current.as_ref()
    }

    #[must_use]
    pub fn history(&self) -> &[SearchHistoryEntry] {
        &self.history
    }

    /// Drops the current result set. History is preserved; it only ends with
    /// the session.
    pub fn clear(&mut self) {
        self.current = None;
    }
}

/// Builds the history entry for a finished aggregation pass, stamped with the
/// current time.
#[must_use]
pub fn new_history_entry(
    query: &str,
    anchors: &[Anchor],
    records: &[PoiRecord],
    outcomes: &[AnchorOutcome],
) -> SearchHistoryEntry {
    SearchHistoryEntry {
        timestamp: Utc::now(),
        query: query.to_string(),
        anchor_ids: anchors.iter().map(|a| a.id.clone()).collect(),
        total_records: records.len(),
        outcomes: outcomes.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use poisweep_core::AnchorStatus;

    fn record(anchor_id: &str) -> PoiRecord {
        PoiRecord {
            name: "Test POI".to_string(),
            address: None,
            latitude: 12.9,
            longitude: 77.6,
            rating: None,
            review_count: 0,
            categories: Vec::new(),
            phone: None,
            website: None,
            external_link: None,
            distance_km: 1.0,
            source_anchor_id: anchor_id.to_string(),
            search_query: "atm".to_string(),
            retrieved_at: DateTime::<Utc>::MIN_UTC,
        }
    }

    fn entry(query: &str) -> SearchHistoryEntry {
        SearchHistoryEntry {
            timestamp: Utc::now(),
            query: query.to_string(),
            anchor_ids: vec!["a".to_string()],
            total_records: 1,
            outcomes: vec![AnchorOutcome::success("a", 1)],
        }
    }

    #[test]
    fn set_current_replaces_result_and_appends_history() {
        let mut store = ResultStore::new();
        assert!(store.current().is_none());

        store.set_current(
            vec![record("a")],
            vec![AnchorOutcome::success("a", 1)],
            entry("atm"),
        );
        assert_eq!(store.current().unwrap().records.len(), 1);
        assert_eq!(store.history().len(), 1);

        store.set_current(Vec::new(), Vec::new(), entry("cafe"));
        assert!(store.current().unwrap().records.is_empty());
        assert_eq!(store.history().len(), 2, "history is append-only");
        assert_eq!(store.history()[0].query, "atm");
        assert_eq!(store.history()[1].query, "cafe");
    }

    #[test]
    fn clear_drops_current_but_keeps_history() {
        let mut store = ResultStore::new();
        store.set_current(
            vec![record("a")],
            vec![AnchorOutcome::success("a", 1)],
            entry("atm"),
        );
        store.clear();
        assert!(store.current().is_none());
        assert_eq!(store.history().len(), 1);
    }

    #[test]
    fn history_entry_captures_counts_and_provenance() {
        let anchors = vec![
            Anchor::new("a", "A", 12.9, 77.6).unwrap(),
            Anchor::new("b", "B", 12.95, 77.65).unwrap(),
        ];
        let records = vec![record("a"), record("a"), record("b")];
        let outcomes = vec![
            AnchorOutcome::success("a", 2),
            AnchorOutcome {
                anchor_id: "b".to_string(),
                status: AnchorStatus::PartialSuccess,
                records_returned: 1,
                error_detail: Some("1 record(s) skipped".to_string()),
            },
        ];
        let e = new_history_entry("atm", &anchors, &records, &outcomes);
        assert_eq!(e.query, "atm");
        assert_eq!(e.anchor_ids, vec!["a", "b"]);
        assert_eq!(e.total_records, 3);
        assert_eq!(e.outcomes.len(), 2);
    }
}
