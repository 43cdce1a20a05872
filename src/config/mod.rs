//! Typed runtime configuration
//!
//! All knobs arrive as CLI flags and are converted into these structs once,
//! at startup. The split mirrors the phases of a run: `GrabberSettings` is
//! what one grabber invocation sees, `FetchConfig` drives the scheduler and
//! `MergeConfig` drives the merge engine.

use crate::models::Site;
use std::path::PathBuf;
use std::time::Duration;

/// Per-invocation grabber settings, passed through to the subprocess.
#[derive(Debug, Clone)]
pub struct GrabberSettings {
    /// External grabber program (the host manifest's `grab` script runner).
    pub program: String,
    /// Arguments placed before the per-site arguments, e.g. `run grab ---`.
    pub leading_args: Vec<String>,
    pub days: Option<u32>,
    pub max_connections: u32,
    pub delay_ms: Option<u64>,
    pub timeout_ms: Option<u64>,
    /// Hard kill timer for one grabber run.
    pub wall_clock: Duration,
    /// Minimum `<programme ` occurrences for an artifact to count as valid.
    pub min_programmes: usize,
}

impl GrabberSettings {
    /// Settings for a retry after a failed attempt: fewer connections, a
    /// fixed inter-request delay and a tighter kill timer. Everything else
    /// is carried over unchanged.
    pub fn safer_retry(&self) -> Self {
        Self {
            max_connections: self.max_connections.min(5),
            delay_ms: Some(1000),
            wall_clock: self.wall_clock.min(Duration::from_secs(600)),
            ..self.clone()
        }
    }
}

/// Scheduler settings: pool size, retry count and backoff persistence.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub concurrency: usize,
    pub retries: u32,
    /// Reuse existing non-empty artifacts instead of re-running the grabber.
    pub resume: bool,
    pub backoff: bool,
    pub backoff_file: PathBuf,
    /// Attempt sites even when they appear in the backoff file, and do not
    /// append new failures to it.
    pub force: bool,
    /// Progress report cadence; `None` disables the reporter.
    pub progress_interval: Option<Duration>,
}

/// Merge engine settings.
#[derive(Debug, Clone)]
pub struct MergeConfig {
    /// Window within which two programmes' start/stop pairs are considered
    /// the same broadcast.
    pub fuzzy: chrono::Duration,
    /// Tie-break order; earlier entries outrank later ones, listed sites
    /// outrank unlisted ones.
    pub prefer_sites: Vec<Site>,
}

/// Full runtime configuration for one run.
#[derive(Debug, Clone)]
pub struct Config {
    pub sites_file: PathBuf,
    pub output: PathBuf,
    /// Artifact directory; stable across runs so `--resume` can reuse files.
    pub tmp_dir: PathBuf,
    pub playlist: Option<String>,
    pub grabber: GrabberSettings,
    pub fetch: FetchConfig,
    pub merge: MergeConfig,
}

impl Config {
    /// Artifact path for one site: `<tmp>/<site>.xml`.
    pub fn artifact_path(&self, site: &Site) -> PathBuf {
        self.tmp_dir.join(format!("{site}.xml"))
    }
}
