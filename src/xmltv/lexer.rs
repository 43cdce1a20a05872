//! Structural XMLTV lexer
//!
//! Extracts `<channel>` and `<programme>` records with regular expressions
//! rather than a full XML parse. The inputs come from a single upstream
//! generator family, so the shapes are predictable; unknown sub-elements are
//! ignored and whitespace is tolerated. Channel fragments are preserved
//! verbatim for re-emission.

use crate::models::{Channel, Credits, EpisodeNum, LangText, Programme, Site};
use crate::xmltv::time::parse_timestamp;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static CHANNEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)<channel\s+id="([^"]*)"[^>]*>(.*?)</channel>"#).unwrap());
static DISPLAY_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<display-name[^>]*>(.*?)</display-name>").unwrap());
static ICON_SRC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<icon[^>]*\bsrc="([^"]*)""#).unwrap());
static URL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<url[^>]*>(.*?)</url>").unwrap());

static PROGRAMME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<programme\s+([^>]*)>(.*?)</programme>").unwrap());
static START_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bstart="([^"]*)""#).unwrap());
static STOP_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bstop="([^"]*)""#).unwrap());
static CHANNEL_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bchannel="([^"]*)""#).unwrap());
static LANG_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\blang="([^"]*)""#).unwrap());
static SYSTEM_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bsystem="([^"]*)""#).unwrap());

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<title([^>]*)>(.*?)</title>").unwrap());
static SUB_TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<sub-title([^>]*)>(.*?)</sub-title>").unwrap());
static DESC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<desc([^>]*)>(.*?)</desc>").unwrap());
static CREDITS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<credits[^>]*>(.*?)</credits>").unwrap());
static CREDIT_ROLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)<(director|actor|writer|producer|presenter)[^>]*>(.*?)</(?:director|actor|writer|producer|presenter)>",
    )
    .unwrap()
});
static CATEGORY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<category[^>]*>(.*?)</category>").unwrap());
static EPISODE_NUM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<episode-num([^>]*)>(.*?)</episode-num>").unwrap());
static RATING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<rating[^>]*>(.*?)</rating>").unwrap());
static RATING_VALUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<value[^>]*>(.*?)</value>").unwrap());

/// The structured content of one site artifact.
#[derive(Debug, Default)]
pub struct ParsedDocument {
    pub channels: Vec<Channel>,
    pub programmes: Vec<Programme>,
}

/// Parse one XMLTV document into channels and programmes.
///
/// Programmes whose `start` or `stop` fail the timestamp grammar (or run
/// backwards) are dropped; the rest of the document stays valid.
pub fn parse_document(content: &str, site: &Site) -> ParsedDocument {
    let channels = parse_channels(content, site);
    let programmes = parse_programmes(content, site);
    ParsedDocument {
        channels,
        programmes,
    }
}

fn parse_channels(content: &str, site: &Site) -> Vec<Channel> {
    let mut channels = Vec::new();
    for caps in CHANNEL_RE.captures_iter(content) {
        let raw_xml = caps.get(0).unwrap().as_str().to_string();
        let body = caps.get(2).unwrap().as_str();
        channels.push(Channel {
            id: unescape_text(&caps[1]),
            display_name: DISPLAY_NAME_RE
                .captures(body)
                .map(|c| unescape_text(&c[1]))
                .unwrap_or_default(),
            icon_url: ICON_SRC_RE
                .captures(body)
                .map(|c| unescape_text(&c[1]))
                .filter(|s| !s.is_empty()),
            homepage_url: URL_RE
                .captures(body)
                .map(|c| unescape_text(&c[1]))
                .filter(|s| !s.is_empty()),
            source_site: site.clone(),
            raw_xml,
        });
    }
    channels
}

fn parse_programmes(content: &str, site: &Site) -> Vec<Programme> {
    let mut programmes = Vec::new();
    let mut dropped = 0usize;

    for caps in PROGRAMME_RE.captures_iter(content) {
        let attrs = caps.get(1).unwrap().as_str();
        let body = caps.get(2).unwrap().as_str();

        let Some(channel_id) = attr_value(&CHANNEL_ATTR_RE, attrs) else {
            dropped += 1;
            continue;
        };
        let start = attr_value(&START_ATTR_RE, attrs).map(|s| parse_timestamp(&s));
        let stop = attr_value(&STOP_ATTR_RE, attrs).map(|s| parse_timestamp(&s));
        let (Some(Ok(start)), Some(Ok(stop))) = (start, stop) else {
            dropped += 1;
            continue;
        };
        if stop < start {
            dropped += 1;
            continue;
        }

        programmes.push(Programme {
            channel_id,
            start,
            stop,
            titles: lang_texts(&TITLE_RE, body),
            sub_titles: lang_texts(&SUB_TITLE_RE, body),
            descs: lang_texts(&DESC_RE, body),
            credits: parse_credits(body),
            categories: unique_texts(&CATEGORY_RE, body),
            episode_nums: parse_episode_nums(body),
            icon_urls: icon_urls(body),
            ratings: parse_ratings(body),
            source_site: site.clone(),
        });
    }

    if dropped > 0 {
        debug!(site = %site, dropped, "dropped programmes with unusable timestamps");
    }
    programmes
}

fn parse_credits(body: &str) -> Credits {
    let mut credits = Credits::default();
    let Some(block) = CREDITS_RE.captures(body) else {
        return credits;
    };
    for caps in CREDIT_ROLE_RE.captures_iter(block.get(1).unwrap().as_str()) {
        let name = unescape_text(&caps[2]);
        if name.is_empty() {
            continue;
        }
        let list = match &caps[1] {
            "director" => &mut credits.directors,
            "actor" => &mut credits.actors,
            "writer" => &mut credits.writers,
            "producer" => &mut credits.producers,
            _ => &mut credits.presenters,
        };
        if !list.contains(&name) {
            list.push(name);
        }
    }
    credits
}

fn parse_episode_nums(body: &str) -> Vec<EpisodeNum> {
    EPISODE_NUM_RE
        .captures_iter(body)
        .filter_map(|caps| {
            let text = unescape_text(&caps[2]);
            if text.is_empty() {
                return None;
            }
            Some(EpisodeNum {
                system: attr_value(&SYSTEM_ATTR_RE, &caps[1]).filter(|s| !s.is_empty()),
                text,
            })
        })
        .collect()
}

fn parse_ratings(body: &str) -> Vec<String> {
    let mut ratings = Vec::new();
    for caps in RATING_RE.captures_iter(body) {
        if let Some(value) = RATING_VALUE_RE.captures(caps.get(1).unwrap().as_str()) {
            let text = unescape_text(&value[1]);
            if !text.is_empty() && !ratings.contains(&text) {
                ratings.push(text);
            }
        }
    }
    ratings
}

fn icon_urls(body: &str) -> Vec<String> {
    let mut urls = Vec::new();
    for caps in ICON_SRC_RE.captures_iter(body) {
        let url = unescape_text(&caps[1]);
        if !url.is_empty() && !urls.contains(&url) {
            urls.push(url);
        }
    }
    urls
}

fn lang_texts(re: &Regex, body: &str) -> Vec<LangText> {
    re.captures_iter(body)
        .filter_map(|caps| {
            let text = unescape_text(&caps[2]);
            if text.is_empty() {
                return None;
            }
            Some(LangText::new(
                attr_value(&LANG_ATTR_RE, &caps[1]).filter(|s| !s.is_empty()),
                text,
            ))
        })
        .collect()
}

fn unique_texts(re: &Regex, body: &str) -> Vec<String> {
    let mut texts = Vec::new();
    for caps in re.captures_iter(body) {
        let text = unescape_text(&caps[1]);
        if !text.is_empty() && !texts.contains(&text) {
            texts.push(text);
        }
    }
    texts
}

fn attr_value(re: &Regex, attrs: &str) -> Option<String> {
    re.captures(attrs).map(|c| unescape_text(&c[1]))
}

fn unescape_text(raw: &str) -> String {
    let trimmed = raw.trim();
    match quick_xml::escape::unescape(trimmed) {
        Ok(cow) => cow.into_owned(),
        Err(_) => trimmed.to_string(),
    }
}
