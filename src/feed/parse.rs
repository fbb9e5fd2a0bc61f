// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::{DateTime, FixedOffset};

use crate::error::FeedError;

/// A parsed feed document: channel title plus its entries in feed order
#[derive(Debug, Clone)]
pub struct ParsedFeed {
    pub title: String,
    pub entries: Vec<FeedEntry>,
}

/// One item of a podcast feed, as handed to the reconciler
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    pub guid: Option<String>,
    pub link: Option<String>,
    pub title: String,
    pub enclosure_url: String,
    pub published_at: Option<DateTime<FixedOffset>>,
    pub description: Option<String>,
    pub episode_number: Option<u32>,
}

impl FeedEntry {
    /// Minimal entry, mostly useful for tests and local tooling
    pub fn new(guid: impl Into<String>, title: impl Into<String>, enclosure_url: impl Into<String>) -> Self {
        Self {
            guid: Some(guid.into()),
            link: None,
            title: title.into(),
            enclosure_url: enclosure_url.into(),
            published_at: None,
            description: None,
            episode_number: None,
        }
    }

    /// The feed's own unique identifier for this entry: guid, then link,
    /// then the enclosure URL.
    pub fn identity(&self) -> &str {
        self.guid
            .as_deref()
            .filter(|g| !g.trim().is_empty())
            .or_else(|| self.link.as_deref().filter(|l| !l.trim().is_empty()))
            .unwrap_or(&self.enclosure_url)
    }
}

/// Parse RSS feed XML bytes into a ParsedFeed
///
/// Items without an audio enclosure are skipped.
pub fn parse_feed(xml_bytes: &[u8]) -> Result<ParsedFeed, FeedError> {
    let channel = rss::Channel::read_from(xml_bytes)?;

    let entries = channel
        .items()
        .iter()
        .filter_map(|item| parse_entry(item).ok())
        .collect();

    Ok(ParsedFeed {
        title: channel.title().to_string(),
        entries,
    })
}

fn parse_entry(item: &rss::Item) -> Result<FeedEntry, FeedError> {
    let title = item
        .title()
        .map(String::from)
        .unwrap_or_else(|| "Untitled Episode".to_string());

    let enclosure = item
        .enclosure()
        .ok_or_else(|| FeedError::MissingEnclosure {
            title: title.clone(),
        })?;

    if enclosure.url().trim().is_empty() {
        return Err(FeedError::MissingIdentifier { title });
    }

    let published_at = item.pub_date().and_then(|date_str| {
        DateTime::parse_from_rfc2822(date_str)
            .ok()
            .or_else(|| parse_relaxed_date(date_str))
    });

    let itunes = item.itunes_ext();

    let description = itunes
        .and_then(|ext| ext.summary())
        .or_else(|| item.description())
        .map(plain_text)
        .filter(|s| !s.is_empty());

    Ok(FeedEntry {
        guid: item.guid().map(|g| g.value().to_string()),
        link: item.link().map(String::from),
        title,
        enclosure_url: enclosure.url().to_string(),
        published_at,
        description,
        episode_number: itunes.and_then(|ext| ext.episode().and_then(|e| e.trim().parse().ok())),
    })
}

/// Try to parse dates that don't strictly conform to RFC 2822
fn parse_relaxed_date(date_str: &str) -> Option<DateTime<FixedOffset>> {
    let formats = [
        "%a, %d %b %Y %H:%M:%S %z",
        "%Y-%m-%dT%H:%M:%S%:z",
        "%Y-%m-%d %H:%M:%S %z",
    ];

    formats
        .iter()
        .find_map(|format| DateTime::parse_from_str(date_str.trim(), format).ok())
        .or_else(|| DateTime::parse_from_rfc3339(date_str.trim()).ok())
}

/// Strip markup from a feed description and decode entities
fn plain_text(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;

    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                text.push(' ');
            }
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }

    let decoded = html_escape::decode_html_entities(&text);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:itunes="http://www.itunes.com/dtds/podcast-1.0.dtd">
  <channel>
    <title>Test Podcast</title>
    <description>A test podcast for unit testing</description>
    <link>https://example.com</link>
    <item>
      <title>Episode 1</title>
      <description>&lt;p&gt;First &amp;amp; best&lt;/p&gt;</description>
      <pubDate>Mon, 01 Jan 2024 12:00:00 +0000</pubDate>
      <guid>ep1-guid</guid>
      <link>https://example.com/ep1</link>
      <enclosure url="https://example.com/ep1.mp3" length="1234567" type="audio/mpeg"/>
      <itunes:episode>1</itunes:episode>
    </item>
    <item>
      <title>Episode 2</title>
      <link>https://example.com/ep2</link>
      <enclosure url="https://example.com/ep2.mp3" type="audio/mpeg"/>
    </item>
    <item>
      <title>No Audio</title>
      <guid>no-audio</guid>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn parse_feed_extracts_title_and_entries() {
        let feed = parse_feed(SAMPLE_FEED.as_bytes()).unwrap();

        assert_eq!(feed.title, "Test Podcast");
        assert_eq!(feed.entries.len(), 2);

        let ep1 = &feed.entries[0];
        assert_eq!(ep1.title, "Episode 1");
        assert_eq!(ep1.guid.as_deref(), Some("ep1-guid"));
        assert_eq!(ep1.enclosure_url, "https://example.com/ep1.mp3");
        assert_eq!(ep1.episode_number, Some(1));
        assert!(ep1.published_at.is_some());
        assert_eq!(ep1.description.as_deref(), Some("First & best"));
    }

    #[test]
    fn parse_feed_skips_items_without_enclosure() {
        let feed = parse_feed(SAMPLE_FEED.as_bytes()).unwrap();
        assert!(feed.entries.iter().all(|e| e.title != "No Audio"));
    }

    #[test]
    fn identity_falls_back_from_guid_to_link_to_enclosure() {
        let feed = parse_feed(SAMPLE_FEED.as_bytes()).unwrap();
        assert_eq!(feed.entries[0].identity(), "ep1-guid");
        assert_eq!(feed.entries[1].identity(), "https://example.com/ep2");

        let mut bare = FeedEntry::new("", "Bare", "https://example.com/bare.mp3");
        bare.guid = None;
        assert_eq!(bare.identity(), "https://example.com/bare.mp3");
    }

    #[test]
    fn parse_feed_rejects_garbage() {
        assert!(parse_feed(b"not a feed").is_err());
    }

    #[test]
    fn relaxed_dates_accept_iso_formats() {
        assert!(parse_relaxed_date("2024-01-15T10:00:00+02:00").is_some());
        assert!(parse_relaxed_date("yesterday").is_none());
    }

    #[test]
    fn plain_text_strips_tags_and_collapses_whitespace() {
        assert_eq!(plain_text("<p>Hello</p>\n<p>world &lt;3</p>"), "Hello world <3");
    }
}
