//! Core data model for sites, channels and programmes
//!
//! A `Site` identifies one upstream schedule source (and the grabber that
//! scrapes it). `Channel` and `Programme` are the structured form of the
//! XMLTV records collected per site; channels additionally keep their raw
//! XML fragment so the writer can re-emit them byte for byte.

use chrono::{DateTime, Utc};
use std::fmt;

/// One upstream schedule source, identified by its grabber hostname
/// (lowercase DNS shape, e.g. `tvtv.us`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Site(String);

impl Site {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Site {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A text payload with an optional `lang` attribute, as carried by XMLTV
/// `title`, `sub-title` and `desc` elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LangText {
    pub lang: Option<String>,
    pub text: String,
}

impl LangText {
    pub fn new(lang: Option<String>, text: String) -> Self {
        Self { lang, text }
    }

    /// Composite key used for deduplication during merge.
    pub fn key(&self) -> String {
        format!("{}|{}", self.lang.as_deref().unwrap_or(""), self.text)
    }
}

/// An `episode-num` entry with its optional numbering `system`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeNum {
    pub system: Option<String>,
    pub text: String,
}

/// Flattened `credits` sub-element: each role is a list of names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credits {
    pub directors: Vec<String>,
    pub actors: Vec<String>,
    pub writers: Vec<String>,
    pub producers: Vec<String>,
    pub presenters: Vec<String>,
}

impl Credits {
    pub fn is_empty(&self) -> bool {
        self.directors.is_empty()
            && self.actors.is_empty()
            && self.writers.is_empty()
            && self.producers.is_empty()
            && self.presenters.is_empty()
    }
}

/// A channel definition collected from one site.
///
/// `raw_xml` preserves the original `<channel>…</channel>` fragment; the
/// writer emits it verbatim so upstream formatting survives the merge.
#[derive(Debug, Clone)]
pub struct Channel {
    pub id: String,
    pub display_name: String,
    pub icon_url: Option<String>,
    pub homepage_url: Option<String>,
    pub source_site: Site,
    pub raw_xml: String,
}

/// A programme record in structured form.
///
/// Invariant: `start <= stop`; records whose timestamps fail to parse are
/// dropped during lexing and never reach this type.
#[derive(Debug, Clone)]
pub struct Programme {
    pub channel_id: String,
    pub start: DateTime<Utc>,
    pub stop: DateTime<Utc>,
    pub titles: Vec<LangText>,
    pub sub_titles: Vec<LangText>,
    pub descs: Vec<LangText>,
    pub credits: Credits,
    pub categories: Vec<String>,
    pub episode_nums: Vec<EpisodeNum>,
    pub icon_urls: Vec<String>,
    pub ratings: Vec<String>,
    pub source_site: Site,
}

impl Programme {
    /// Length of the first description's text, the field the quality scorer
    /// and the desc merge rule both key on.
    pub fn primary_desc_len(&self) -> usize {
        self.descs.first().map(|d| d.text.len()).unwrap_or(0)
    }
}
