// src/pipeline.rs
//! One run: load state, scrape every source, keep the keyword hits that were
//! not notified before, send them in a single message, save state.

use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::config::{AppConfig, SourceConfig};
use crate::extract::{Extractor, RawItem};
use crate::filter::filter;
use crate::notify::Notifier;
use crate::store::{Match, MatchStore, StoreError};

/// One-time metrics registration.
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("scrape_items_total", "Items extracted from listing pages.");
        describe_counter!("scrape_matches_total", "Items matching a keyword.");
        describe_counter!(
            "scrape_new_matches_total",
            "Matches not seen in earlier runs."
        );
        describe_counter!(
            "scrape_extract_errors_total",
            "Sources whose extraction failed."
        );
        describe_counter!("notify_errors_total", "Failed notification attempts.");
        describe_gauge!("scrape_last_run_ts", "Unix ts when the last run finished.");
    });
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceReport {
    pub url: String,
    pub extracted: usize,
    pub matched: usize,
    pub new: usize,
    /// Set when extraction failed and the source was treated as empty.
    pub extract_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum NotifyOutcome {
    /// Nothing new, notifier not called.
    Skipped,
    Sent,
    Failed(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub sources: Vec<SourceReport>,
    pub new_matches: Vec<Match>,
    pub notify: NotifyOutcome,
}

/// Result of scraping all sources against the in-memory store.
#[derive(Debug, Default)]
pub struct Collected {
    pub sources: Vec<SourceReport>,
    pub new_matches: Vec<Match>,
    pub extracted: BTreeMap<String, Vec<RawItem>>,
}

/// Extract, filter and dedup every source, recording new matches in `store`.
/// Extraction failures are logged and count as zero items.
pub async fn collect_new_matches(
    store: &mut MatchStore,
    sources: &[SourceConfig],
    extractor: &dyn Extractor,
) -> Collected {
    ensure_metrics_described();
    let mut out = Collected::default();

    for src in sources {
        let mut report = SourceReport {
            url: src.url.clone(),
            ..SourceReport::default()
        };

        let items = match extractor.extract(&src.url).await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(
                    error = %format!("{e:#}"),
                    url = %src.url,
                    extractor = extractor.name(),
                    "extraction failed; continuing with no items"
                );
                counter!("scrape_extract_errors_total").increment(1);
                report.extract_error = Some(format!("{e:#}"));
                Vec::new()
            }
        };
        report.extracted = items.len();
        counter!("scrape_items_total").increment(items.len() as u64);

        let matches = filter(&items, &src.keywords);
        report.matched = matches.len();
        counter!("scrape_matches_total").increment(matches.len() as u64);

        for m in matches {
            if store.is_new(&src.url, &m) {
                store.record(&src.url, m.clone());
                out.new_matches.push(m);
                report.new += 1;
            }
        }
        counter!("scrape_new_matches_total").increment(report.new as u64);

        tracing::info!(
            url = %report.url,
            extracted = report.extracted,
            matched = report.matched,
            new = report.new,
            "source processed"
        );
        out.extracted.insert(src.url.clone(), items);
        out.sources.push(report);
    }

    out
}

/// Invoke the notifier once if there is anything new. Never fails the run.
pub async fn notify_new(notifier: &dyn Notifier, new_matches: &[Match]) -> NotifyOutcome {
    if new_matches.is_empty() {
        tracing::info!("no new matches; nothing to send");
        return NotifyOutcome::Skipped;
    }
    match notifier.notify(new_matches).await {
        Ok(()) => NotifyOutcome::Sent,
        Err(e) => {
            tracing::error!(
                error = %format!("{e:#}"),
                notifier = notifier.name(),
                "failed to send notification"
            );
            counter!("notify_errors_total").increment(1);
            NotifyOutcome::Failed(format!("{e:#}"))
        }
    }
}

fn write_dump(path: &Path, extracted: &BTreeMap<String, Vec<RawItem>>) {
    let res = serde_json::to_vec_pretty(extracted)
        .map_err(anyhow::Error::from)
        .and_then(|bytes| std::fs::write(path, bytes).map_err(anyhow::Error::from));
    if let Err(e) = res {
        tracing::warn!(path = %path.display(), "writing extracted items: {e:#}");
    }
}

/// Run the whole pipeline once.
///
/// Fails only when the match store cannot be loaded or saved; extraction and
/// notification problems are logged and reflected in the report.
pub async fn run_once(
    config: &AppConfig,
    extractor: &dyn Extractor,
    notifier: &dyn Notifier,
) -> Result<RunReport, StoreError> {
    let started_at = Utc::now();
    let mut store = MatchStore::open(&config.state_path, config.reset_on_corrupt)?;

    let collected = collect_new_matches(&mut store, &config.sources, extractor).await;

    if let Some(dump) = &config.dump_path {
        write_dump(dump, &collected.extracted);
    }

    let notify = notify_new(notifier, &collected.new_matches).await;

    store.save()?;
    gauge!("scrape_last_run_ts").set(started_at.timestamp() as f64);

    tracing::info!(
        sources = collected.sources.len(),
        new = collected.new_matches.len(),
        notify = ?notify,
        state = %store.path().display(),
        "run finished"
    );

    Ok(RunReport {
        started_at,
        sources: collected.sources,
        new_matches: collected.new_matches,
        notify,
    })
}
