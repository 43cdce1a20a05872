//! Run orchestration
//!
//! Wires the phases together: startup validation, site list load, backoff
//! exclusion, the fetch batch, then the strictly sequential merge, filter,
//! enrichment and write. A single bad site never fails the batch; a failed
//! write does.

use crate::config::Config;
use crate::enrich::enrich_guide;
use crate::errors::{AppError, AppResult};
use crate::fetch;
use crate::fetch::progress::{ProgressCounters, spawn_reporter};
use crate::merge::MergeEngine;
use crate::models::Site;
use crate::sources::{playlist, sites};
use crate::xmltv::{lexer, writer};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Fallback directory for deriving the site list when the sites file is
/// absent: the grabber repository keeps one directory per site.
const SITES_DIR: &str = "sites";

/// Summary of one completed run.
#[derive(Debug)]
pub struct RunStats {
    pub sites_succeeded: usize,
    pub sites_failed: usize,
    pub channels: usize,
    pub programmes: usize,
    pub categories_added: usize,
}

/// Execute a full run: fetch, merge, filter, enrich, write.
pub async fn run(config: Config) -> AppResult<RunStats> {
    let started = Instant::now();
    verify_grab_manifest(Path::new("."))?;

    // Resolve the channel filter before spending time on grabbers, so a bad
    // playlist reference fails the run immediately.
    let channel_filter = match &config.playlist {
        Some(source_ref) => playlist::load_channel_filter(source_ref).await?,
        None => None,
    };

    tokio::fs::create_dir_all(&config.tmp_dir).await?;

    let all_sites = sites::load_sites(&config.sites_file, Path::new(SITES_DIR))?;
    let sites = exclude_backoff_sites(&config, all_sites);

    let cancel = CancellationToken::new();
    spawn_interrupt_listener(cancel.clone());

    let counters = Arc::new(ProgressCounters::new(sites.len()));
    let reporter_cancel = cancel.child_token();
    let reporter = config
        .fetch
        .progress_interval
        .map(|every| spawn_reporter(Arc::clone(&counters), every, reporter_cancel.clone()));

    let outcome = fetch::run_batch(&config, &sites, &counters, &cancel).await;

    reporter_cancel.cancel();
    if let Some(handle) = reporter {
        let _ = handle.await;
    }
    if cancel.is_cancelled() {
        return Err(AppError::Interrupted {
            message: "stopped before the merge phase; no guide written".to_string(),
        });
    }

    let mut engine = MergeEngine::new(&config.merge);
    for site in engine.order_sites(&outcome.succeeded) {
        let path = config.artifact_path(&site);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) => {
                warn!(site = %site, file = %path.display(), error = %e, "skipping unreadable artifact");
                continue;
            }
        };
        engine.ingest(lexer::parse_document(&content, &site));
    }
    let mut guide = engine.into_guide();

    if let Some(keep) = &channel_filter {
        let before = guide.channel_count();
        guide.retain_channels(keep);
        info!(
            kept = guide.channel_count(),
            dropped = before - guide.channel_count(),
            "applied playlist channel filter"
        );
    }

    let categories_added = enrich_guide(&mut guide);

    writer::write_guide(&guide, &config.output).await?;

    let stats = RunStats {
        sites_succeeded: outcome.succeeded.len(),
        sites_failed: outcome.failed.len(),
        channels: guide.channel_count(),
        programmes: guide.programme_count(),
        categories_added,
    };
    info!(
        sites_ok = stats.sites_succeeded,
        sites_failed = stats.sites_failed,
        channels = stats.channels,
        programmes = stats.programmes,
        categories_added = stats.categories_added,
        elapsed = %humantime::format_duration(round_to_seconds(started.elapsed())),
        "run complete"
    );
    Ok(stats)
}

/// The tool must run inside a working tree whose manifest exposes a `grab`
/// script; anything else is a fatal startup error.
pub fn verify_grab_manifest(dir: &Path) -> AppResult<()> {
    let manifest_path = dir.join("package.json");
    let content = std::fs::read_to_string(&manifest_path).map_err(|e| {
        AppError::configuration(format!(
            "cannot read {} (run inside the grabber working tree): {e}",
            manifest_path.display()
        ))
    })?;
    let manifest: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| AppError::configuration(format!("malformed {}: {e}", manifest_path.display())))?;
    if manifest
        .get("scripts")
        .and_then(|s| s.get("grab"))
        .and_then(|g| g.as_str())
        .is_none()
    {
        return Err(AppError::configuration(format!(
            "{} has no \"grab\" script; this does not look like a grabber working tree",
            manifest_path.display()
        )));
    }
    Ok(())
}

/// Drop sites listed in the backoff file, unless `--force` overrides it.
fn exclude_backoff_sites(config: &Config, all_sites: Vec<Site>) -> Vec<Site> {
    if !config.fetch.backoff || config.fetch.force {
        return all_sites;
    }
    let skip = fetch::backoff::load(&config.fetch.backoff_file);
    filter_backoff(all_sites, &skip)
}

/// Pure half of the backoff exclusion, split out for testing.
pub fn filter_backoff(all_sites: Vec<Site>, skip: &HashSet<String>) -> Vec<Site> {
    let before = all_sites.len();
    let sites: Vec<Site> = all_sites
        .into_iter()
        .filter(|s| !skip.contains(s.as_str()))
        .collect();
    if sites.len() < before {
        info!(
            skipped = before - sites.len(),
            "excluded backoff-listed sites"
        );
    }
    sites
}

fn spawn_interrupt_listener(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping grabbers");
            cancel.cancel();
        }
    });
}

fn round_to_seconds(d: std::time::Duration) -> std::time::Duration {
    std::time::Duration::from_secs(d.as_secs())
}
