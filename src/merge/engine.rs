//! Merge engine
//!
//! Ingests parsed site documents one at a time and maintains the merged
//! guide: one best channel per id, and per-channel programme lists with no
//! two entries fuzzy-equal under the configured window.

use crate::config::MergeConfig;
use crate::merge::fuzzy::same_broadcast;
use crate::merge::score::{score_channel, score_programme};
use crate::models::{Channel, Credits, Programme, Site};
use crate::xmltv::lexer::ParsedDocument;
use chrono::Duration;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info};

/// The merged channel and programme state.
///
/// Keyed by channel id; iteration order is the id order, which keeps output
/// deterministic across runs.
#[derive(Debug, Default)]
pub struct MergedGuide {
    channels: BTreeMap<String, Channel>,
    programmes: BTreeMap<String, Vec<Programme>>,
}

impl MergedGuide {
    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels.values()
    }

    pub fn channel(&self, id: &str) -> Option<&Channel> {
        self.channels.get(id)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn programme_count(&self) -> usize {
        self.programmes.values().map(Vec::len).sum()
    }

    pub fn programmes_for(&self, channel_id: &str) -> &[Programme] {
        self.programmes
            .get(channel_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn programmes(&self) -> impl Iterator<Item = &Programme> {
        self.programmes.values().flatten()
    }

    pub fn programmes_mut(&mut self) -> impl Iterator<Item = &mut Programme> {
        self.programmes.values_mut().flatten()
    }

    /// All programmes across all channels, sorted ascending by start time.
    pub fn programmes_by_start(&self) -> Vec<&Programme> {
        let mut all: Vec<&Programme> = self.programmes().collect();
        all.sort_by_key(|p| p.start);
        all
    }

    /// Keep only the channels whose id is in `keep`, dropping their
    /// programmes along with them.
    pub fn retain_channels(&mut self, keep: &HashSet<String>) {
        self.channels.retain(|id, _| keep.contains(id));
        self.programmes.retain(|id, _| keep.contains(id));
    }
}

/// Merges parsed site documents into a [`MergedGuide`].
pub struct MergeEngine {
    window: Duration,
    prefer_sites: Vec<Site>,
    guide: MergedGuide,
}

impl MergeEngine {
    pub fn new(config: &MergeConfig) -> Self {
        Self {
            window: config.fuzzy,
            prefer_sites: config.prefer_sites.clone(),
            guide: MergedGuide::default(),
        }
    }

    /// Reorder sites for ingestion: non-preferred sites first in their given
    /// order, preferred sites last in `prefer_sites` order. Later ingestion
    /// gives preferred sites the newer-record position in tie-breaks.
    pub fn order_sites(&self, sites: &[Site]) -> Vec<Site> {
        let mut ordered: Vec<Site> = sites
            .iter()
            .filter(|s| !self.prefer_sites.contains(s))
            .cloned()
            .collect();
        for preferred in &self.prefer_sites {
            if sites.contains(preferred) {
                ordered.push(preferred.clone());
            }
        }
        ordered
    }

    /// Merge one site's parsed document into the guide.
    pub fn ingest(&mut self, doc: ParsedDocument) {
        let (channels, programmes) = (doc.channels.len(), doc.programmes.len());
        for channel in doc.channels {
            self.merge_channel(channel);
        }
        for programme in doc.programmes {
            self.merge_programme(programme);
        }
        debug!(channels, programmes, "ingested site document");
    }

    pub fn into_guide(self) -> MergedGuide {
        info!(
            channels = self.guide.channel_count(),
            programmes = self.guide.programme_count(),
            "merge complete"
        );
        self.guide
    }

    /// Insert a channel, or replace the existing one iff the incoming
    /// definition scores strictly higher.
    fn merge_channel(&mut self, channel: Channel) {
        match self.guide.channels.get_mut(&channel.id) {
            None => {
                self.guide.channels.insert(channel.id.clone(), channel);
            }
            Some(existing) => {
                if score_channel(&channel) > score_channel(existing) {
                    *existing = channel;
                }
            }
        }
    }

    /// Append a programme, or fuse it with the first fuzzy-equal entry in
    /// its channel's list.
    fn merge_programme(&mut self, programme: Programme) {
        let window = self.window;
        let list = self
            .guide
            .programmes
            .entry(programme.channel_id.clone())
            .or_default();
        match list
            .iter()
            .position(|existing| same_broadcast(existing, &programme, window))
        {
            Some(i) => {
                let existing = list.remove(i);
                list.insert(i, merge_two(existing, programme, &self.prefer_sites));
            }
            None => list.push(programme),
        }
    }
}

/// Rank of a site in the preference list; unlisted sites rank last.
fn site_rank(prefer_sites: &[Site], site: &Site) -> usize {
    prefer_sites
        .iter()
        .position(|s| s == site)
        .unwrap_or(usize::MAX)
}

/// Fuse two versions of the same broadcast into one record.
///
/// The higher quality score wins; on a tie the preferred-site rank decides,
/// and when neither is preferred the already-merged record (`a`) wins.
fn merge_two(a: Programme, b: Programme, prefer_sites: &[Site]) -> Programme {
    let (score_a, score_b) = (score_programme(&a), score_programme(&b));
    let b_wins = score_b > score_a
        || (score_b == score_a
            && site_rank(prefer_sites, &b.source_site) < site_rank(prefer_sites, &a.source_site));
    let (winner, loser) = if b_wins { (b, a) } else { (a, b) };

    let start = winner.start.min(loser.start);
    let stop = winner.stop.max(loser.stop);
    let descs = if loser.primary_desc_len() > winner.primary_desc_len() {
        loser.descs
    } else {
        winner.descs
    };

    Programme {
        channel_id: winner.channel_id,
        start,
        stop,
        titles: union_keyed(winner.titles, loser.titles, |t| t.key()),
        sub_titles: union_keyed(winner.sub_titles, loser.sub_titles, |t| t.key()),
        descs,
        credits: Credits {
            directors: union_strings(winner.credits.directors, loser.credits.directors),
            actors: union_strings(winner.credits.actors, loser.credits.actors),
            writers: union_strings(winner.credits.writers, loser.credits.writers),
            producers: union_strings(winner.credits.producers, loser.credits.producers),
            presenters: union_strings(winner.credits.presenters, loser.credits.presenters),
        },
        categories: union_strings(winner.categories, loser.categories),
        episode_nums: union_keyed(winner.episode_nums, loser.episode_nums, |e| e.text.clone()),
        icon_urls: union_strings(winner.icon_urls, loser.icon_urls),
        ratings: union_strings(winner.ratings, loser.ratings),
        source_site: winner.source_site,
    }
}

/// Union keyed by `key`, preserving the base order; on a key collision the
/// incoming entry replaces the base one in place.
fn union_keyed<T, K, F>(mut base: Vec<T>, incoming: Vec<T>, key: F) -> Vec<T>
where
    K: PartialEq,
    F: Fn(&T) -> K,
{
    for item in incoming {
        let k = key(&item);
        match base.iter_mut().find(|existing| key(existing) == k) {
            Some(slot) => *slot = item,
            None => base.push(item),
        }
    }
    base
}

/// Set-union of string lists preserving first-seen order.
fn union_strings(mut base: Vec<String>, incoming: Vec<String>) -> Vec<String> {
    for s in incoming {
        if !base.contains(&s) {
            base.push(s);
        }
    }
    base
}
