// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::error::FeedError;
use crate::http::HttpClient;

use super::parse::{ParsedFeed, parse_feed};

/// Source of feed entries for a subscription
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    /// Fetch and parse the feed at `source` (URL or local file path)
    async fn fetch(&self, source: &str) -> Result<ParsedFeed, FeedError>;
}

/// Feed fetcher that downloads RSS over HTTP or reads it from disk
#[derive(Clone)]
pub struct RssFeedFetcher<C> {
    client: C,
}

impl<C: HttpClient> RssFeedFetcher<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: HttpClient> FeedFetcher for RssFeedFetcher<C> {
    async fn fetch(&self, source: &str) -> Result<ParsedFeed, FeedError> {
        let bytes = if is_url(source) {
            url::Url::parse(source)?;
            debug!(url = source, "fetching feed");
            fetch_feed_bytes(&self.client, source).await?.to_vec()
        } else {
            debug!(path = source, "reading local feed file");
            read_feed_file(Path::new(source))?
        };
        parse_feed(&bytes)
    }
}

/// Fetch raw feed bytes from a URL (without parsing)
pub async fn fetch_feed_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Bytes, FeedError> {
    client
        .get_bytes(url)
        .await
        .map_err(|e| FeedError::FetchFailed {
            url: url.to_string(),
            source: e,
        })
}

/// Read raw feed bytes from a local file (without parsing)
pub fn read_feed_file(path: &Path) -> Result<Vec<u8>, FeedError> {
    std::fs::read(path).map_err(|e| FeedError::FileReadFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Determine if a string is a URL or a file path
pub fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpResponse;
    use tempfile::tempdir;

    const FEED: &str = r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <title>Local Podcast</title>
    <description>Test</description>
    <item>
      <title>Episode 1</title>
      <guid>ep1-guid</guid>
      <enclosure url="https://example.com/ep1.mp3" type="audio/mpeg"/>
    </item>
  </channel>
</rss>"#;

    struct StaticClient;

    #[async_trait]
    impl HttpClient for StaticClient {
        async fn get_bytes(&self, _url: &str) -> Result<Bytes, reqwest::Error> {
            Ok(Bytes::from_static(FEED.as_bytes()))
        }

        async fn get_stream(&self, _url: &str) -> Result<HttpResponse, reqwest::Error> {
            unreachable!("feeds are fetched as bytes")
        }
    }

    #[test]
    fn is_url_detects_http() {
        assert!(is_url("http://example.com/feed.xml"));
        assert!(is_url("https://example.com/feed.xml"));
    }

    #[test]
    fn is_url_rejects_file_paths() {
        assert!(!is_url("/path/to/feed.xml"));
        assert!(!is_url("./feed.xml"));
        assert!(!is_url("feed.xml"));
    }

    #[tokio::test]
    async fn fetches_over_http_client() {
        let fetcher = RssFeedFetcher::new(StaticClient);
        let feed = fetcher.fetch("https://example.com/feed.xml").await.unwrap();

        assert_eq!(feed.title, "Local Podcast");
        assert_eq!(feed.entries.len(), 1);
    }

    #[tokio::test]
    async fn reads_local_feed_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("feed.xml");
        std::fs::write(&path, FEED).unwrap();

        let fetcher = RssFeedFetcher::new(StaticClient);
        let feed = fetcher.fetch(path.to_str().unwrap()).await.unwrap();
        assert_eq!(feed.entries[0].guid.as_deref(), Some("ep1-guid"));
    }

    #[tokio::test]
    async fn missing_local_file_is_a_fetch_error() {
        let fetcher = RssFeedFetcher::new(StaticClient);
        let result = fetcher.fetch("/definitely/not/here.xml").await;
        assert!(matches!(result, Err(FeedError::FileReadFailed { .. })));
    }
}
