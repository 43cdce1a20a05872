//! Sites file loading
//!
//! One site per line, `#` comments and blank lines ignored. Entries that do
//! not look like a hostname are silently dropped. When the file is missing,
//! the list falls back to the direct subdirectory names of `./sites` (the
//! layout the grabber repository uses).

use crate::errors::{AppError, AppResult};
use crate::models::Site;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, info};

static HOSTNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9.-]+\.[a-z]{2,}$").unwrap());

/// Load the site list from `path`, or from the subdirectories of
/// `fallback_dir` when the file does not exist.
pub fn load_sites(path: &Path, fallback_dir: &Path) -> AppResult<Vec<Site>> {
    if path.exists() {
        let content = std::fs::read_to_string(path).map_err(|e| AppError::Sites {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let sites = parse_sites(&content);
        info!(count = sites.len(), file = %path.display(), "loaded site list");
        return Ok(sites);
    }

    if fallback_dir.is_dir() {
        let mut sites = Vec::new();
        let entries = std::fs::read_dir(fallback_dir).map_err(|e| AppError::Sites {
            path: fallback_dir.to_path_buf(),
            message: e.to_string(),
        })?;
        for entry in entries.flatten() {
            if !entry.path().is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                push_site(&mut sites, name);
            }
        }
        sites.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        info!(count = sites.len(), dir = %fallback_dir.display(), "derived site list from grabber directories");
        return Ok(sites);
    }

    Err(AppError::Sites {
        path: path.to_path_buf(),
        message: format!(
            "sites file not found and no {} directory to fall back to",
            fallback_dir.display()
        ),
    })
}

/// Parse sites file content, dropping comments, blanks and malformed entries.
pub fn parse_sites(content: &str) -> Vec<Site> {
    let mut sites = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        push_site(&mut sites, line);
    }
    sites
}

fn push_site(sites: &mut Vec<Site>, name: &str) {
    if !HOSTNAME_RE.is_match(name) {
        debug!(entry = name, "dropping entry without hostname shape");
        return;
    }
    let site = Site::from(name);
    if !sites.contains(&site) {
        sites.push(site);
    }
}
