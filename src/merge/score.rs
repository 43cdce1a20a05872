//! Field-richness quality scores
//!
//! Absolute values are meaningless; only pairwise comparison matters when
//! the merge has to pick between two versions of the same record.

use crate::models::{Channel, Programme};

/// Score a channel definition by how much it carries beyond the bare id.
pub fn score_channel(channel: &Channel) -> u32 {
    let mut score = 0;
    if channel.icon_url.is_some() {
        score += 3;
    }
    if channel.homepage_url.is_some() {
        score += 2;
    }
    score + (channel.display_name.len() as u32 / 6).min(10)
}

/// Score a programme record by field richness.
pub fn score_programme(programme: &Programme) -> u32 {
    let mut score = (programme.primary_desc_len() as u32 / 50).min(10);
    score += 2 * programme.categories.len() as u32;
    if !programme.sub_titles.is_empty() {
        score += 3;
    }
    if !programme.episode_nums.is_empty() {
        score += 5;
    }
    if !programme.icon_urls.is_empty() {
        score += 1;
    }
    if !programme.ratings.is_empty() {
        score += 1;
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Credits, EpisodeNum, LangText, Site};
    use chrono::{TimeZone, Utc};

    fn channel(display_name: &str, icon: bool, url: bool) -> Channel {
        Channel {
            id: "ch1".to_string(),
            display_name: display_name.to_string(),
            icon_url: icon.then(|| "https://img/i.png".to_string()),
            homepage_url: url.then(|| "https://example.com".to_string()),
            source_site: Site::from("a.com"),
            raw_xml: String::new(),
        }
    }

    fn bare_programme() -> Programme {
        Programme {
            channel_id: "ch1".to_string(),
            start: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
            stop: Utc.with_ymd_and_hms(2024, 1, 1, 13, 0, 0).unwrap(),
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

    #[test]
    fn channel_score_weights_icon_url_and_name_length() {
        assert_eq!(score_channel(&channel("", false, false)), 0);
        assert_eq!(score_channel(&channel("abcdef", true, false)), 4);
        assert_eq!(score_channel(&channel("abcdef", true, true)), 6);
        // Name contribution caps at 10.
        let long = "x".repeat(200);
        assert_eq!(score_channel(&channel(&long, false, false)), 10);
    }

    #[test]
    fn programme_score_weights_rich_fields() {
        let mut p = bare_programme();
        assert_eq!(score_programme(&p), 0);

        p.descs = vec![LangText::new(None, "d".repeat(120))];
        assert_eq!(score_programme(&p), 2);

        p.categories = vec!["News".to_string(), "Local".to_string()];
        assert_eq!(score_programme(&p), 6);

        p.sub_titles = vec![LangText::new(None, "Part 1".to_string())];
        p.episode_nums = vec![EpisodeNum {
            system: None,
            text: "S01E01".to_string(),
        }];
        p.icon_urls = vec!["https://img/p.png".to_string()];
        p.ratings = vec!["TV-PG".to_string()];
        assert_eq!(score_programme(&p), 16);
    }

    #[test]
    fn desc_contribution_caps_at_ten() {
        let mut p = bare_programme();
        p.descs = vec![LangText::new(None, "d".repeat(5000))];
        assert_eq!(score_programme(&p), 10);
    }
}
