//! Rule-based category enrichment
//!
//! A static table maps category names to regex lists. Each merged programme
//! is scanned once over its lowercased titles and descriptions; any rule hit
//! adds the category unless an equivalent one is already present.

use crate::merge::MergedGuide;
use crate::models::Programme;
use regex::Regex;
use std::sync::LazyLock;
use tracing::info;

/// Category assignment rules, applied to a lowercased scan buffer.
static CATEGORY_RULES: LazyLock<Vec<(&'static str, Vec<Regex>)>> = LazyLock::new(|| {
    fn rules(patterns: &[&str]) -> Vec<Regex> {
        patterns.iter().map(|p| Regex::new(p).unwrap()).collect()
    }
    vec![
        (
            "Sports",
            rules(&[
                r"\b(nfl|nba|mlb|nhl|ufc|mma|nascar|pga|fifa|uefa)\b",
                r"\b(football|soccer|basketball|baseball|hockey|tennis|golf|boxing|cricket|rugby|athletics)\b",
                r"\b(premier league|champions league|formula 1|grand prix|olympics|world cup)\b",
            ]),
        ),
        (
            "News",
            rules(&[r"\bnews\b", r"\b(headlines?|newshour|newscast|bulletin)\b"]),
        ),
        (
            "Movies",
            rules(&[r"\b(movie|film)\b", r"\bcinema\b"]),
        ),
        (
            "Kids",
            rules(&[r"\b(kids|cartoons?|animated|animation|children)\b"]),
        ),
        (
            "Documentary",
            rules(&[r"\b(documentary|docuseries|true crime)\b"]),
        ),
        (
            "Music",
            rules(&[r"\b(music|concert|symphony|orchestra)\b"]),
        ),
    ]
});

/// Apply the category rules to every programme in the guide.
///
/// Returns the number of categories added.
pub fn enrich_guide(guide: &mut MergedGuide) -> usize {
    let mut added = 0;
    for programme in guide.programmes_mut() {
        added += enrich_programme(programme);
    }
    if added > 0 {
        info!(added, "category enrichment complete");
    }
    added
}

fn enrich_programme(programme: &mut Programme) -> usize {
    let buffer = scan_buffer(programme);
    let mut added = 0;
    for (category, rules) in CATEGORY_RULES.iter() {
        if programme
            .categories
            .iter()
            .any(|c| c.eq_ignore_ascii_case(category))
        {
            continue;
        }
        if rules.iter().any(|re| re.is_match(&buffer)) {
            programme.categories.push((*category).to_string());
            added += 1;
        }
    }
    added
}

/// Lowercased concatenation of every title and description text.
fn scan_buffer(programme: &Programme) -> String {
    let mut buffer = String::new();
    for t in &programme.titles {
        buffer.push_str(&t.text);
        buffer.push(' ');
    }
    for d in &programme.descs {
        buffer.push_str(&d.text);
        buffer.push(' ');
    }
    buffer.to_lowercase()
}
