//! Backoff list persistence
//!
//! A plain text file, one site per line, append-only. Appends go through
//! the OS append mode so concurrent workers interleave at line granularity
//! instead of clobbering each other.

use crate::models::Site;
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::warn;

/// Load the set of sites currently on the backoff list.
///
/// A missing file is an empty list; an unreadable one is logged and treated
/// the same, since backoff is an optimization rather than a correctness
/// requirement.
pub fn load(path: &Path) -> HashSet<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashSet::new(),
        Err(e) => {
            warn!(file = %path.display(), error = %e, "could not read backoff list");
            HashSet::new()
        }
    }
}

/// Append one site to the backoff list.
pub fn append(path: &Path, site: &Site) -> std::io::Result<()> {
    let mut file = OpenOptions::new().append(true).create(true).open(path)?;
    writeln!(file, "{site}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(&dir.path().join("none.txt")).is_empty());
    }

    #[test]
    fn append_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".skip-sites.txt");
        append(&path, &Site::from("a.com")).unwrap();
        append(&path, &Site::from("b.com")).unwrap();
        append(&path, &Site::from("a.com")).unwrap();

        let set = load(&path);
        assert_eq!(set.len(), 2);
        assert!(set.contains("a.com"));
        assert!(set.contains("b.com"));
    }

    #[test]
    fn append_never_rewrites_existing_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".skip-sites.txt");
        std::fs::write(&path, "a.com\n").unwrap();
        append(&path, &Site::from("b.com")).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "a.com\nb.com\n");
    }
}
