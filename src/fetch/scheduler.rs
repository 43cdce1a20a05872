//! Bounded-concurrency fetch scheduler
//!
//! A fixed pool of workers drains the site list through a shared monotonic
//! index. Each worker runs one site at a time: resume short-circuit, then
//! launch with retry-on-safer-settings, then backoff bookkeeping on
//! terminal failure. Workers share nothing else but the result lists and
//! the progress counters.

use crate::config::Config;
use crate::fetch::progress::ProgressCounters;
use crate::fetch::{backoff, launcher};
use crate::models::Site;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Disjoint success/failure site lists for one batch.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub succeeded: Vec<Site>,
    pub failed: Vec<Site>,
}

/// Drain `sites` through a pool of `config.fetch.concurrency` workers.
///
/// Completion order is unspecified; the merge phase imposes its own site
/// ordering afterwards.
pub async fn run_batch(
    config: &Config,
    sites: &[Site],
    counters: &Arc<ProgressCounters>,
    cancel: &CancellationToken,
) -> FetchOutcome {
    if sites.is_empty() {
        return FetchOutcome::default();
    }

    let sites: Arc<Vec<Site>> = Arc::new(sites.to_vec());
    let next = Arc::new(AtomicUsize::new(0));
    let succeeded = Arc::new(Mutex::new(Vec::new()));
    let failed = Arc::new(Mutex::new(Vec::new()));

    let workers = config.fetch.concurrency.clamp(1, sites.len());
    info!(sites = sites.len(), workers, "starting fetch batch");

    let mut handles = Vec::with_capacity(workers);
    for _ in 0..workers {
        let config = config.clone();
        let sites = Arc::clone(&sites);
        let next = Arc::clone(&next);
        let succeeded = Arc::clone(&succeeded);
        let failed = Arc::clone(&failed);
        let counters = Arc::clone(counters);
        let cancel = cancel.clone();
        handles.push(tokio::spawn(async move {
            worker_loop(&config, &sites, &next, &succeeded, &failed, &counters, &cancel).await;
        }));
    }
    futures::future::join_all(handles).await;

    let outcome = FetchOutcome {
        succeeded: std::mem::take(&mut *succeeded.lock().expect("worker panicked")),
        failed: std::mem::take(&mut *failed.lock().expect("worker panicked")),
    };
    info!(
        succeeded = outcome.succeeded.len(),
        failed = outcome.failed.len(),
        "fetch batch drained"
    );
    outcome
}

#[allow(clippy::too_many_arguments)]
async fn worker_loop(
    config: &Config,
    sites: &[Site],
    next: &AtomicUsize,
    succeeded: &Mutex<Vec<Site>>,
    failed: &Mutex<Vec<Site>>,
    counters: &ProgressCounters,
    cancel: &CancellationToken,
) {
    loop {
        if cancel.is_cancelled() {
            break;
        }
        let index = next.fetch_add(1, Ordering::SeqCst);
        let Some(site) = sites.get(index) else {
            break;
        };

        counters.site_started();
        let success = fetch_site(config, site, cancel).await;
        counters.site_done(success);

        if success {
            succeeded.lock().expect("worker panicked").push(site.clone());
        } else {
            failed.lock().expect("worker panicked").push(site.clone());
            record_backoff(config, site, cancel);
        }
    }
}

/// Run one site to a terminal outcome: resume short-circuit, then up to
/// `retries` re-launches with progressively safer settings.
async fn fetch_site(config: &Config, site: &Site, cancel: &CancellationToken) -> bool {
    let out_path = config.artifact_path(site);

    if config.fetch.resume {
        match tokio::fs::metadata(&out_path).await {
            Ok(meta) if meta.len() > 0 => {
                info!(site = %site, "reusing existing artifact");
                return true;
            }
            _ => {}
        }
    }

    let mut settings = config.grabber.clone();
    for attempt in 0..=config.fetch.retries {
        if cancel.is_cancelled() {
            return false;
        }
        if attempt > 0 {
            settings = settings.safer_retry();
            info!(site = %site, attempt, "retrying with safer settings");
        }
        if launcher::launch(site, &out_path, &settings, cancel).await {
            return true;
        }
    }
    false
}

/// Best-effort backoff append on terminal failure. Cancelled runs are not
/// recorded; a write failure is logged and swallowed.
fn record_backoff(config: &Config, site: &Site, cancel: &CancellationToken) {
    if !config.fetch.backoff || config.fetch.force || cancel.is_cancelled() {
        return;
    }
    match backoff::append(&config.fetch.backoff_file, site) {
        Ok(()) => info!(site = %site, file = %config.fetch.backoff_file.display(), "added site to backoff list"),
        Err(e) => warn!(site = %site, error = %e, "could not append to backoff list"),
    }
}
