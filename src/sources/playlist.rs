//! M3U playlist channel-id filter
//!
//! The playlist is only consulted for its `tvg-id` attributes; everything
//! else in the EXTINF metadata is ignored. A playlist that yields no ids is
//! treated as "no filter available" rather than an empty whitelist.

use crate::errors::{AppError, AppResult};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

static TVG_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"tvg-id="([^"]*)""#).unwrap());

/// Extract the set of non-empty `tvg-id` values from playlist content.
pub fn extract_channel_ids(content: &str) -> HashSet<String> {
    TVG_ID_RE
        .captures_iter(content)
        .map(|caps| caps[1].to_string())
        .filter(|id| !id.is_empty())
        .collect()
}

/// Load the channel-id whitelist from a local path or an http(s) URL.
///
/// Returns `None` when the playlist yields no ids, which disables filtering.
pub async fn load_channel_filter(source_ref: &str) -> AppResult<Option<HashSet<String>>> {
    let content = if is_http_url(source_ref) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        client
            .get(source_ref)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| AppError::playlist(source_ref, e.to_string()))?
            .text()
            .await?
    } else {
        tokio::fs::read_to_string(source_ref)
            .await
            .map_err(|e| AppError::playlist(source_ref, e.to_string()))?
    };

    let ids = extract_channel_ids(&content);
    if ids.is_empty() {
        warn!(playlist = source_ref, "playlist has no tvg-id entries, filtering disabled");
        return Ok(None);
    }
    info!(playlist = source_ref, channels = ids.len(), "loaded playlist channel filter");
    Ok(Some(ids))
}

fn is_http_url(source_ref: &str) -> bool {
    Url::parse(source_ref)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAYLIST: &str = r#"#EXTM3U
#EXTINF:-1 tvg-id="ch1" tvg-logo="https://img/1.png" group-title="News",Channel One
https://stream.example/1
#EXTINF:-1 tvg-id="ch3" group-title="Misc",Channel Three
https://stream.example/3
#EXTINF:-1 tvg-id="" group-title="Misc",No Id
https://stream.example/4
#EXTINF:-1 tvg-id="ch1",Channel One Backup
https://stream.example/1b
"#;

    #[test]
    fn extracts_and_deduplicates_tvg_ids() {
        let ids = extract_channel_ids(PLAYLIST);
        assert_eq!(ids.len(), 2);
        assert!(ids.contains("ch1"));
        assert!(ids.contains("ch3"));
    }

    #[test]
    fn empty_tvg_ids_are_ignored() {
        let ids = extract_channel_ids(r#"#EXTINF:-1 tvg-id="",Nameless"#);
        assert!(ids.is_empty());
    }

    #[test]
    fn detects_http_urls() {
        assert!(is_http_url("https://example.com/list.m3u"));
        assert!(is_http_url("http://example.com/list.m3u"));
        assert!(!is_http_url("playlist.m3u"));
        assert!(!is_http_url("/tmp/playlist.m3u"));
        assert!(!is_http_url("file:///tmp/playlist.m3u"));
    }

    #[tokio::test]
    async fn loads_from_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.m3u");
        tokio::fs::write(&path, PLAYLIST).await.unwrap();
        let filter = load_channel_filter(path.to_str().unwrap()).await.unwrap();
        assert_eq!(filter.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn playlist_without_ids_disables_filtering() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.m3u");
        tokio::fs::write(&path, "#EXTM3U\nhttps://stream.example/1\n")
            .await
            .unwrap();
        let filter = load_channel_filter(path.to_str().unwrap()).await.unwrap();
        assert!(filter.is_none());
    }

    #[tokio::test]
    async fn missing_local_playlist_is_an_error() {
        assert!(load_channel_filter("/nonexistent/list.m3u").await.is_err());
    }
}
