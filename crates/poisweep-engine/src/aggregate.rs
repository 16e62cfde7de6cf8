//! Multi-anchor fan-out aggregation.
//!
//! Issues one provider search per anchor with bounded concurrency, funnels
//! every raw entry through normalization, and records one outcome per anchor
//! regardless of how the call went. Per-anchor failure is isolated; only an
//! authentication failure poisons the whole pass, because the same
//! credential would fail for every subsequent anchor too.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tokio::time::Instant;

use poisweep_core::{Anchor, AnchorOutcome, AnchorStatus, AppConfig, PoiRecord};
use poisweep_provider::{
    normalize, retry_with_backoff, ProviderClient, ProviderError, SearchRequest,
};

/// Progress callback: `(completed_count, total_count, last_outcome)`.
/// Advisory only; invoked once per anchor as it completes, in completion
/// order.
pub type ProgressFn = dyn Fn(usize, usize, &AnchorOutcome) + Send + Sync;

/// Tuning knobs for one aggregation pass.
#[derive(Debug, Clone)]
pub struct AggregateParams {
    pub radius_km_hint: f64,
    pub max_results_per_anchor: u32,
    /// Upper bound on concurrently in-flight provider calls; 0 is treated
    /// as 1.
    pub max_concurrent: usize,
    /// Politeness delay after each provider call.
    pub inter_request_delay: Duration,
    /// Wall-clock budget for the whole pass; anchors starting after the
    /// deadline fail with detail `"timeout"`.
    pub budget: Duration,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub country: Option<String>,
    pub language: Option<String>,
    /// Cooperative cancel signal, checked on each call boundary.
    pub cancel: Arc<AtomicBool>,
}

impl AggregateParams {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            radius_km_hint: config.default_radius_km,
            max_results_per_anchor: config.default_max_results,
            max_concurrent: config.max_concurrent_anchors,
            inter_request_delay: Duration::from_millis(config.inter_request_delay_ms),
            budget: Duration::from_secs(config.aggregate_budget_secs),
            max_retries: config.max_retries,
            backoff_base_ms: config.retry_backoff_base_ms,
            country: config.country.clone(),
            language: config.language.clone(),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }
}

struct AnchorResult {
    index: usize,
    outcome: AnchorOutcome,
    records: Vec<PoiRecord>,
}

/// Fans `query` out across `anchors` and merges the normalized results.
///
/// Always returns one [`AnchorOutcome`] per anchor, in anchor input order.
/// The record sequence order is unspecified. An authentication failure marks
/// every outcome `Failed` with the same detail and yields zero records;
/// cancellation marks not-yet-started anchors `Cancelled` and returns the
/// records already collected.
///
/// # Errors
///
/// Returns [`ProviderError::InvalidRequest`] for argument violations (empty
/// query, non-positive radius, zero limit) before any network call. Provider
/// and normalization failures never surface as `Err`; they are absorbed into
/// the outcomes.
pub async fn aggregate(
    client: &ProviderClient,
    query: &str,
    anchors: &[Anchor],
    params: &AggregateParams,
    progress: Option<&ProgressFn>,
) -> Result<(Vec<PoiRecord>, Vec<AnchorOutcome>), ProviderError> {
    // Validate the shared arguments once, against a throwaway anchor, so a
    // programmer error surfaces before the first network call.
    if let Some(first) = anchors.first() {
        SearchRequest::new(
            query,
            first.clone(),
            params.radius_km_hint,
            params.max_results_per_anchor,
        )?;
    } else {
        return Ok((Vec::new(), Vec::new()));
    }

    let total = anchors.len();
    let deadline = Instant::now() + params.budget;
    let completed = AtomicUsize::new(0);
    // First observed authentication failure; poisons anchors not yet started.
    let auth_detail: Mutex<Option<String>> = Mutex::new(None);

    let mut results: Vec<AnchorResult> = stream::iter(anchors.iter().enumerate())
        .map(|(index, anchor)| {
            let auth_detail = &auth_detail;
            let completed = &completed;
            async move {
                let result =
                    run_anchor(client, query, anchor, index, params, deadline, auth_detail).await;
                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                tracing::debug!(
                    anchor = %result.outcome.anchor_id,
                    status = %result.outcome.status,
                    records = result.outcome.records_returned,
                    done,
                    total,
                    "anchor completed"
                );
                if let Some(cb) = progress {
                    cb(done, total, &result.outcome);
                }
                result
            }
        })
        .buffer_unordered(params.max_concurrent.max(1))
        .collect()
        .await;

    results.sort_by_key(|r| r.index);

    // Authentication failure is fatal for the whole pass: the same credential
    // fails everywhere, so partial results would be misleading.
    let auth = auth_detail.into_inner().unwrap_or(None);
    if let Some(detail) = auth {
        let outcomes = anchors
            .iter()
            .map(|a| AnchorOutcome::failed(a.id.clone(), detail.clone()))
            .collect();
        return Ok((Vec::new(), outcomes));
    }

    let mut records = Vec::new();
    let mut outcomes = Vec::with_capacity(total);
    for r in results {
        records.extend(r.records);
        outcomes.push(r.outcome);
    }
    Ok((records, outcomes))
}

async fn run_anchor(
    client: &ProviderClient,
    query: &str,
    anchor: &Anchor,
    index: usize,
    params: &AggregateParams,
    deadline: Instant,
    auth_detail: &Mutex<Option<String>>,
) -> AnchorResult {
    let empty = |outcome: AnchorOutcome| AnchorResult {
        index,
        outcome,
        records: Vec::new(),
    };

    if params.cancel.load(Ordering::SeqCst) {
        return empty(AnchorOutcome::cancelled(anchor.id.clone()));
    }
    if let Some(detail) = auth_detail.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone() {
        return empty(AnchorOutcome::failed(anchor.id.clone(), detail));
    }
    let now = Instant::now();
    if now >= deadline {
        return empty(AnchorOutcome::failed(anchor.id.clone(), "timeout"));
    }

    let request = match SearchRequest::new(
        query,
        anchor.clone(),
        params.radius_km_hint,
        params.max_results_per_anchor,
    ) {
        Ok(r) => r.with_locale(params.country.clone(), params.language.clone()),
        Err(e) => return empty(AnchorOutcome::failed(anchor.id.clone(), e.detail())),
    };

    // The per-anchor call (including retries) never outlives the pass budget.
    let remaining = deadline - now;
    let call = retry_with_backoff(params.max_retries, params.backoff_base_ms, || {
        client.search(&request)
    });
    let raw = match tokio::time::timeout(remaining, call).await {
        Ok(Ok(entries)) => entries,
        Ok(Err(err)) => {
            if let ProviderError::Auth(_) = &err {
                let detail = err.detail();
                let mut guard = auth_detail
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner);
                guard.get_or_insert_with(|| detail.clone());
            }
            tracing::warn!(anchor = %anchor.id, error = %err, "anchor search failed");
            return empty(AnchorOutcome::failed(anchor.id.clone(), err.detail()));
        }
        Err(_) => {
            tracing::warn!(anchor = %anchor.id, "anchor search exceeded pass budget");
            return empty(AnchorOutcome::failed(anchor.id.clone(), "timeout"));
        }
    };

    if !params.inter_request_delay.is_zero() {
        tokio::time::sleep(params.inter_request_delay).await;
    }

    let retrieved_at = Utc::now();
    let mut records = Vec::with_capacity(raw.len());
    let mut skipped = 0usize;
    for entry in &raw {
        match normalize(entry, anchor, query, retrieved_at) {
            Ok(record) => records.push(record),
            Err(err) => {
                skipped += 1;
                tracing::warn!(anchor = %anchor.id, error = %err, "skipping unnormalizable record");
            }
        }
    }

    let status = if skipped == 0 {
        AnchorStatus::Success
    } else {
        AnchorStatus::PartialSuccess
    };
    let outcome = AnchorOutcome {
        anchor_id: anchor.id.clone(),
        status,
        records_returned: records.len(),
        error_detail: (skipped > 0).then(|| format!("{skipped} record(s) skipped")),
    };
    AnchorResult {
        index,
        outcome,
        records,
    }
}
