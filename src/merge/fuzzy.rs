//! Fuzzy temporal equivalence for programme records
//!
//! Sources report the same broadcast with small schedule skews, and some
//! truncate programmes at day boundaries. Two records on the same channel
//! are the same broadcast when their `[start, stop)` intervals strictly
//! overlap, or when both endpoints sit within the configured window.

use crate::models::Programme;
use chrono::Duration;

/// Decide whether two programme records refer to the same broadcast.
pub fn same_broadcast(a: &Programme, b: &Programme, window: Duration) -> bool {
    if a.channel_id != b.channel_id {
        return false;
    }
    let overlap = a.start < b.stop && a.stop > b.start;
    let close = (a.start - b.start).abs() <= window && (a.stop - b.stop).abs() <= window;
    overlap || close
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Credits, LangText, Site};
    use chrono::{TimeZone, Utc};

    fn programme(channel: &str, start: (u32, u32), stop: (u32, u32)) -> Programme {
        Programme {
            channel_id: channel.to_string(),
            start: Utc
                .with_ymd_and_hms(2024, 1, 1, start.0, start.1, 0)
                .unwrap(),
            stop: Utc.with_ymd_and_hms(2024, 1, 1, stop.0, stop.1, 0).unwrap(),
            titles: vec![LangText::new(None, "Show".to_string())],
            sub_titles: vec![],
            descs: vec![],
            credits: Credits::default(),
            categories: vec![],
            episode_nums: vec![],
            icon_urls: vec![],
            ratings: vec![],
            source_site: Site::from("a.com"),
        }
    }

    fn window() -> Duration {
        Duration::seconds(90)
    }

    #[test]
    fn overlapping_intervals_match() {
        let a = programme("ch1", (12, 0), (13, 0));
        let b = programme("ch1", (12, 30), (14, 0));
        assert!(same_broadcast(&a, &b, window()));
        assert!(same_broadcast(&b, &a, window()));
    }

    #[test]
    fn adjacent_intervals_do_not_overlap() {
        // [12:00, 13:00) and [13:00, 14:00) share only the boundary, and the
        // endpoint deltas exceed the window.
        let a = programme("ch1", (12, 0), (13, 0));
        let b = programme("ch1", (13, 0), (14, 0));
        assert!(!same_broadcast(&a, &b, window()));
    }

    #[test]
    fn near_identical_endpoints_match_without_overlap() {
        // Disjoint intervals, but both endpoint deltas are inside the window.
        let mut a = programme("ch1", (12, 0), (12, 0));
        let mut b = programme("ch1", (12, 0), (12, 0));
        a.stop = a.start + Duration::seconds(10);
        b.start += Duration::seconds(20);
        b.stop = b.start + Duration::seconds(20);
        assert!(a.stop <= b.start);
        assert!(same_broadcast(&a, &b, window()));
    }

    #[test]
    fn skewed_endpoints_within_window_match() {
        let a = programme("ch1", (12, 0), (13, 0));
        let mut b = programme("ch1", (12, 0), (13, 0));
        b.start += Duration::seconds(30);
        b.stop -= Duration::seconds(30);
        assert!(same_broadcast(&a, &b, window()));
    }

    #[test]
    fn distant_programmes_do_not_match() {
        let a = programme("ch1", (12, 0), (13, 0));
        let b = programme("ch1", (14, 0), (15, 0));
        assert!(!same_broadcast(&a, &b, window()));
    }

    #[test]
    fn different_channels_never_match() {
        let a = programme("ch1", (12, 0), (13, 0));
        let b = programme("ch2", (12, 0), (13, 0));
        assert!(!same_broadcast(&a, &b, window()));
    }
}
