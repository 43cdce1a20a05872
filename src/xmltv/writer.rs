//! Streaming XMLTV output
//!
//! Channels are emitted verbatim from their source fragments; programmes
//! are re-serialized from the merged model, sorted ascending by start time.
//! Any write failure fails the whole run.

use crate::errors::{AppError, AppResult};
use crate::merge::MergedGuide;
use crate::models::{LangText, Programme};
use crate::xmltv::time::format_timestamp;
use quick_xml::escape::escape;
use std::path::Path;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::info;

const GENERATOR_NAME: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Write the merged guide to `path` as one XMLTV document.
pub async fn write_guide(guide: &MergedGuide, path: &Path) -> AppResult<()> {
    write_inner(guide, path)
        .await
        .map_err(|e| AppError::GuideWrite {
            path: path.to_path_buf(),
            source: e,
        })?;
    info!(
        file = %path.display(),
        channels = guide.channel_count(),
        programmes = guide.programme_count(),
        "guide written"
    );
    Ok(())
}

async fn write_inner(guide: &MergedGuide, path: &Path) -> std::io::Result<()> {
    let file = tokio::fs::File::create(path).await?;
    let mut writer = BufWriter::new(file);

    writer
        .write_all(b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n")
        .await?;
    writer
        .write_all(format!("<tv generator-info-name=\"{GENERATOR_NAME}\">\n").as_bytes())
        .await?;

    for channel in guide.channels() {
        writer.write_all(b"  ").await?;
        writer.write_all(channel.raw_xml.as_bytes()).await?;
        writer.write_all(b"\n").await?;
    }

    let mut buffer = String::new();
    for programme in guide.programmes_by_start() {
        buffer.clear();
        render_programme(programme, &mut buffer);
        writer.write_all(buffer.as_bytes()).await?;
    }

    writer.write_all(b"</tv>\n").await?;
    writer.flush().await?;
    Ok(())
}

fn render_programme(p: &Programme, out: &mut String) {
    out.push_str(&format!(
        "  <programme start=\"{}\" stop=\"{}\" channel=\"{}\">\n",
        format_timestamp(p.start),
        format_timestamp(p.stop),
        escape(&p.channel_id),
    ));

    for title in &p.titles {
        push_lang_element(out, "title", title);
    }
    for sub_title in &p.sub_titles {
        push_lang_element(out, "sub-title", sub_title);
    }
    for desc in &p.descs {
        push_lang_element(out, "desc", desc);
    }

    if !p.credits.is_empty() {
        out.push_str("    <credits>\n");
        let roles = [
            ("director", &p.credits.directors),
            ("actor", &p.credits.actors),
            ("writer", &p.credits.writers),
            ("producer", &p.credits.producers),
            ("presenter", &p.credits.presenters),
        ];
        for (tag, names) in roles {
            for name in names {
                out.push_str(&format!("      <{tag}>{}</{tag}>\n", escape(name)));
            }
        }
        out.push_str("    </credits>\n");
    }

    for category in &p.categories {
        out.push_str(&format!(
            "    <category>{}</category>\n",
            escape(category)
        ));
    }
    for episode in &p.episode_nums {
        match &episode.system {
            Some(system) => out.push_str(&format!(
                "    <episode-num system=\"{}\">{}</episode-num>\n",
                escape(system),
                escape(&episode.text)
            )),
            None => out.push_str(&format!(
                "    <episode-num>{}</episode-num>\n",
                escape(&episode.text)
            )),
        }
    }
    for icon in &p.icon_urls {
        out.push_str(&format!("    <icon src=\"{}\"/>\n", escape(icon)));
    }
    for rating in &p.ratings {
        out.push_str(&format!(
            "    <rating system=\"\">\n      <value>{}</value>\n    </rating>\n",
            escape(rating)
        ));
    }

    out.push_str("  </programme>\n");
}

fn push_lang_element(out: &mut String, tag: &str, lang_text: &LangText) {
    let lang = lang_text.lang.as_deref().unwrap_or("en");
    out.push_str(&format!(
        "    <{tag} lang=\"{}\">{}</{tag}>\n",
        escape(lang),
        escape(&lang_text.text)
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MergeConfig;
    use crate::merge::MergeEngine;
    use crate::models::{Credits, EpisodeNum, Site};
    use crate::xmltv::lexer::{ParsedDocument, parse_document};
    use chrono::{Duration, TimeZone, Utc};

    fn guide_from(channels: Vec<crate::models::Channel>, programmes: Vec<Programme>) -> MergedGuide {
        let mut engine = MergeEngine::new(&MergeConfig {
            fuzzy: Duration::seconds(90),
            prefer_sites: vec![],
        });
        engine.ingest(ParsedDocument {
            channels,
            programmes,
        });
        engine.into_guide()
    }

    fn programme(channel: &str, hour: u32, title: &str) -> Programme {
        Programme {
            channel_id: channel.to_string(),
            start: Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap(),
            stop: Utc.with_ymd_and_hms(2024, 1, 1, hour + 1, 0, 0).unwrap(),
            titles: vec![LangText::new(None, title.to_string())],
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

    #[tokio::test]
    async fn emits_programmes_sorted_by_start() {
        let guide = guide_from(
            vec![],
            vec![
                programme("zz", 18, "Late"),
                programme("aa", 12, "Noon"),
                programme("mm", 15, "Afternoon"),
            ],
        );
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("guide.xml");
        write_guide(&guide, &path).await.unwrap();

        let output = std::fs::read_to_string(&path).unwrap();
        let noon = output.find("Noon").unwrap();
        let afternoon = output.find("Afternoon").unwrap();
        let late = output.find("Late").unwrap();
        assert!(noon < afternoon && afternoon < late);
        assert!(output.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<tv "));
        assert!(output.trim_end().ends_with("</tv>"));
    }

    #[tokio::test]
    async fn channels_are_emitted_verbatim() {
        let source = r#"<tv>
  <channel id="ch1">
    <display-name>One &amp; Only</display-name>
    <icon    src="https://img/1.png"/>
  </channel>
  <programme start="20240101120000 +0000" stop="20240101130000 +0000" channel="ch1">
    <title>Show</title>
  </programme>
  <programme start="20240101130000 +0000" stop="20240101140000 +0000" channel="ch1">
    <title>Other</title>
  </programme>
  <programme start="20240101140000 +0000" stop="20240101150000 +0000" channel="ch1">
    <title>Third</title>
  </programme>
  <programme start="20240101150000 +0000" stop="20240101160000 +0000" channel="ch1">
    <title>Fourth</title>
  </programme>
  <programme start="20240101160000 +0000" stop="20240101170000 +0000" channel="ch1">
    <title>Fifth</title>
  </programme>
</tv>"#;
        let doc = parse_document(source, &Site::from("a.com"));
        let raw = doc.channels[0].raw_xml.clone();
        let guide = guide_from(doc.channels, doc.programmes);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("guide.xml");
        write_guide(&guide, &path).await.unwrap();
        let output = std::fs::read_to_string(&path).unwrap();
        // The original fragment survives byte for byte, odd spacing included.
        assert!(output.contains(&raw));
    }

    #[tokio::test]
    async fn default_language_is_english() {
        let mut p = programme("ch1", 12, "Show");
        p.descs = vec![LangText::new(Some("fr".to_string()), "Résumé".to_string())];
        let guide = guide_from(vec![], vec![p]);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("guide.xml");
        write_guide(&guide, &path).await.unwrap();
        let output = std::fs::read_to_string(&path).unwrap();
        assert!(output.contains(r#"<title lang="en">Show</title>"#));
        assert!(output.contains(r#"<desc lang="fr">Résumé</desc>"#));
    }

    #[tokio::test]
    async fn escapes_text_payloads() {
        let mut p = programme("ch1", 12, "Q&A <live>");
        p.ratings = vec!["TV-\"PG\"".to_string()];
        let guide = guide_from(vec![], vec![p]);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("guide.xml");
        write_guide(&guide, &path).await.unwrap();
        let output = std::fs::read_to_string(&path).unwrap();
        assert!(output.contains("Q&amp;A &lt;live&gt;"));
        assert!(output.contains("<rating system=\"\">"));
        assert!(output.contains("&quot;PG&quot;"));
    }

    #[tokio::test]
    async fn round_trips_programme_fields() {
        let mut p = programme("ch1", 12, "Show");
        p.sub_titles = vec![LangText::new(None, "Part 2".to_string())];
        p.descs = vec![LangText::new(Some("en".to_string()), "All about it.".to_string())];
        p.credits.directors = vec!["D. One".to_string()];
        p.credits.actors = vec!["A. Two".to_string(), "A. Three".to_string()];
        p.categories = vec!["Drama".to_string()];
        p.episode_nums = vec![EpisodeNum {
            system: Some("onscreen".to_string()),
            text: "S02E05".to_string(),
        }];
        p.icon_urls = vec!["https://img/p.png".to_string()];
        p.ratings = vec!["TV-PG".to_string()];
        let guide = guide_from(vec![], vec![p.clone()]);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("guide.xml");
        write_guide(&guide, &path).await.unwrap();
        let output = std::fs::read_to_string(&path).unwrap();

        let reparsed = parse_document(&output, &Site::from("x.com"));
        assert_eq!(reparsed.programmes.len(), 1);
        let r = &reparsed.programmes[0];
        assert_eq!(r.channel_id, p.channel_id);
        assert_eq!(r.start, p.start);
        assert_eq!(r.stop, p.stop);
        // The writer stamps the default language on bare entries.
        assert_eq!(r.titles[0].lang.as_deref(), Some("en"));
        assert_eq!(r.titles[0].text, "Show");
        assert_eq!(r.sub_titles[0].text, "Part 2");
        assert_eq!(r.descs, p.descs);
        assert_eq!(r.credits, p.credits);
        assert_eq!(r.categories, p.categories);
        assert_eq!(r.episode_nums, p.episode_nums);
        assert_eq!(r.icon_urls, p.icon_urls);
        assert_eq!(r.ratings, p.ratings);
    }
}
