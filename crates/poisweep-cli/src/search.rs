//! `poisweep search`: run one aggregation pass and report/export the merged
//! result set.

use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use anyhow::Context;
use clap::Args;

use poisweep_core::{Anchor, AnchorOutcome, AppConfig};
use poisweep_engine::{aggregate, new_history_entry, AggregateParams, ResultStore};
use poisweep_export::{export, ExportFormat};
use poisweep_provider::ProviderClient;

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// What to look for near each anchor (e.g. "atm", "pharmacy").
    pub query: String,

    /// Registry anchor id to include (repeatable; default: all anchors).
    #[arg(long = "anchor")]
    pub anchor_ids: Vec<String>,

    /// Manual anchor as "lat,lon" (repeatable; searched in addition to any
    /// registry anchors).
    #[arg(long = "at")]
    pub at: Vec<String>,

    #[arg(long)]
    pub radius_km: Option<f64>,

    /// Maximum results per anchor.
    #[arg(long)]
    pub limit: Option<u32>,

    /// Concurrently in-flight provider calls.
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Export format: csv, json, or xlsx.
    #[arg(long)]
    pub format: Option<String>,

    /// Export file path; defaults to a timestamped name when --format is set.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub async fn run(config: &AppConfig, args: SearchArgs) -> anyhow::Result<()> {
    let anchors = resolve_anchors(config, &args)?;
    anyhow::ensure!(!anchors.is_empty(), "no anchors selected");

    let api_key = config
        .provider_api_key
        .as_deref()
        .context("POISWEEP_PROVIDER_API_KEY is not set")?;
    let client = ProviderClient::with_base_url(
        api_key,
        config.request_timeout_secs,
        &config.provider_base_url,
    )?;

    let mut params = AggregateParams::from_config(config);
    if let Some(radius) = args.radius_km {
        params.radius_km_hint = radius;
    }
    if let Some(limit) = args.limit {
        params.max_results_per_anchor = limit;
    }
    if let Some(concurrency) = args.concurrency {
        params.max_concurrent = concurrency;
    }

    // Ctrl-C flips the cancel flag; the pass returns whatever it has.
    let cancel = Arc::clone(&params.cancel);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("cancellation requested, finishing current anchors");
            cancel.store(true, Ordering::SeqCst);
        }
    });

    let progress = |done: usize, total: usize, outcome: &AnchorOutcome| {
        tracing::info!(
            anchor = %outcome.anchor_id,
            status = %outcome.status,
            records = outcome.records_returned,
            "anchor {done}/{total} complete"
        );
    };

    let (records, outcomes) =
        aggregate(&client, &args.query, &anchors, &params, Some(&progress)).await?;

    let mut store = ResultStore::new();
    let entry = new_history_entry(&args.query, &anchors, &records, &outcomes);
    store.set_current(records, outcomes, entry);

    let current = store
        .current()
        .context("aggregation finished without a result set")?;
    print_summary(&args.query, current);

    if args.format.is_some() || args.out.is_some() {
        write_export(&args, &current.records)?;
    }
    Ok(())
}

fn resolve_anchors(config: &AppConfig, args: &SearchArgs) -> anyhow::Result<Vec<Anchor>> {
    let mut anchors = Vec::new();

    if args.anchor_ids.is_empty() && args.at.is_empty() {
        let registry = poisweep_core::load_anchors(&config.anchors_path)?;
        anchors.extend(registry.to_anchors());
    } else if !args.anchor_ids.is_empty() {
        let registry = poisweep_core::load_anchors(&config.anchors_path)?;
        let all = registry.to_anchors();
        for id in &args.anchor_ids {
            let found = all
                .iter()
                .find(|a| a.id.eq_ignore_ascii_case(id))
                .with_context(|| format!("anchor '{id}' not found in registry"))?;
            anchors.push(found.clone());
        }
    }

    for (i, raw) in args.at.iter().enumerate() {
        let (lat, lon) = parse_lat_lon(raw)?;
        anchors.push(Anchor::new(
            format!("manual-{i}"),
            format!("manual ({lat}, {lon})"),
            lat,
            lon,
        )?);
    }

    Ok(anchors)
}

/// Parses `"lat,lon"` into a degree pair.
pub fn parse_lat_lon(raw: &str) -> anyhow::Result<(f64, f64)> {
    let (lat, lon) = raw
        .split_once(',')
        .with_context(|| format!("expected 'lat,lon', got '{raw}'"))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .with_context(|| format!("bad latitude in '{raw}'"))?;
    let lon: f64 = lon
        .trim()
        .parse()
        .with_context(|| format!("bad longitude in '{raw}'"))?;
    Ok((lat, lon))
}

fn print_summary(query: &str, current: &poisweep_core::ResultSet) {
    println!(
        "query '{query}': {} record(s) from {} anchor(s)",
        current.records.len(),
        current.outcomes.len()
    );
    for o in &current.outcomes {
        match &o.error_detail {
            Some(detail) => println!(
                "  {:<16} {:<16} {:>4}  {detail}",
                o.anchor_id, o.status, o.records_returned
            ),
            None => println!(
                "  {:<16} {:<16} {:>4}",
                o.anchor_id, o.status, o.records_returned
            ),
        }
    }

    // Presentation-only ordering; the merged set itself is unordered.
    let mut nearest: Vec<_> = current.records.iter().collect();
    nearest.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    for record in nearest.iter().take(10) {
        println!(
            "  {:>7.2} km  {}  [{}]",
            record.distance_km, record.name, record.source_anchor_id
        );
    }
}

fn write_export(args: &SearchArgs, records: &[poisweep_core::PoiRecord]) -> anyhow::Result<()> {
    let format: ExportFormat = args.format.as_deref().unwrap_or("csv").parse()?;
    let path = args.out.clone().unwrap_or_else(|| {
        PathBuf::from(format!(
            "poisweep-{}.{}",
            chrono::Utc::now().format("%Y%m%d-%H%M%S"),
            format.extension()
        ))
    });

    let bytes = export(records, format)?;
    std::fs::write(&path, &bytes)
        .with_context(|| format!("failed to write export to {}", path.display()))?;
    println!(
        "exported {} record(s) to {} ({})",
        records.len(),
        path.display(),
        format.mime()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_lat_lon_accepts_spaced_pair() {
        let (lat, lon) = parse_lat_lon(" 12.9382 , 77.6992 ").unwrap();
        assert!((lat - 12.9382).abs() < 1e-9);
        assert!((lon - 77.6992).abs() < 1e-9);
    }

    #[test]
    fn parse_lat_lon_rejects_garbage() {
        assert!(parse_lat_lon("12.9382").is_err());
        assert!(parse_lat_lon("a,b").is_err());
    }
}
