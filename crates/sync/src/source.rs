//! Feed sources: fetch a URL and hand back a parsed [`Feed`].

use std::time::Duration;

use async_trait::async_trait;
use feedsync_core::{Feed, FeedEntry};
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("feed server returned status {status}")]
    Status { status: u16 },

    #[error("failed to parse feed: {0}")]
    Parse(String),
}

/// Fetches and parses one feed.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Feed, FeedError>;
}

/// RSS, Atom and JSON Feed over HTTP.
pub struct HttpFeedSource {
    client: Client,
}

impl HttpFeedSource {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .user_agent(concat!("feedsync/", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self, url: &str) -> Result<Feed, FeedError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        debug!(url, bytes = body.len(), "downloaded feed");
        parse_feed(&body)
    }
}

/// Parse a feed document of any format feed-rs understands.
pub fn parse_feed(body: &[u8]) -> Result<Feed, FeedError> {
    let parsed = feed_rs::parser::parse(body).map_err(|e| FeedError::Parse(e.to_string()))?;
    Ok(convert_feed(parsed))
}

fn convert_feed(feed: feed_rs::model::Feed) -> Feed {
    let link = feed
        .links
        .iter()
        .find(|link| link.rel.as_deref() != Some("self"))
        .or_else(|| feed.links.first())
        .map(|link| link.href.clone())
        .unwrap_or_default();

    // Entries without a link have no identifier and cannot be tracked.
    let entries = feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let link = entry_link(&entry.links)?;
            Some(FeedEntry {
                link,
                title: entry.title.map(|t| t.content).unwrap_or_default(),
                published: entry.published.or(entry.updated),
            })
        })
        .collect();

    Feed {
        title: feed.title.map(|t| t.content).unwrap_or_default(),
        link,
        entries,
    }
}

/// The entry's own page: the first `alternate` (or rel-less) link, else the
/// first link of any kind.
fn entry_link(links: &[feed_rs::model::Link]) -> Option<String> {
    links
        .iter()
        .find(|link| matches!(link.rel.as_deref(), None | Some("alternate")))
        .or_else(|| links.first())
        .map(|link| link.href.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Example Feed</title>
    <link>http://example.com/</link>
    <description>Example</description>
    <item>
      <title>Dated</title>
      <link>http://example.com/1</link>
      <pubDate>Fri, 01 Mar 2024 15:02:00 GMT</pubDate>
    </item>
    <item>
      <title>Undated</title>
      <link>http://example.com/2</link>
    </item>
    <item>
      <title>No link</title>
    </item>
  </channel>
</rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Example Atom</title>
  <link href="http://example.org/feed.xml" rel="self"/>
  <link href="http://example.org/"/>
  <updated>2003-12-13T18:30:02Z</updated>
  <id>urn:uuid:60a76c80-d399-11d9-b93C-0003939e0af6</id>
  <entry>
    <title>Atom-Powered Robots Run Amok</title>
    <link href="http://example.org/2003/12/13/atom03"/>
    <id>urn:uuid:1225c695-cfb8-4ebb-aaaa-80da344efa6a</id>
    <published>2003-12-13T18:30:02Z</published>
    <updated>2003-12-13T18:30:02Z</updated>
  </entry>
</feed>"#;

    #[test]
    fn converts_rss_channel() {
        let feed = parse_feed(RSS.as_bytes()).unwrap();

        assert_eq!(feed.title, "Example Feed");
        assert_eq!(feed.link, "http://example.com/");
        assert_eq!(feed.entries.len(), 2);
        assert_eq!(feed.entries[0].link, "http://example.com/1");
        assert_eq!(feed.entries[0].title, "Dated");
        assert_eq!(
            feed.entries[0].published,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 15, 2, 0).unwrap())
        );
        assert_eq!(feed.entries[1].link, "http://example.com/2");
        assert_eq!(feed.entries[1].published, None);
    }

    #[test]
    fn converts_atom_feed_skipping_self_link() {
        let feed = parse_feed(ATOM.as_bytes()).unwrap();

        assert_eq!(feed.title, "Example Atom");
        assert_eq!(feed.link, "http://example.org/");
        assert_eq!(feed.entries.len(), 1);
        assert_eq!(
            feed.entries[0].link,
            "http://example.org/2003/12/13/atom03"
        );
        assert_eq!(
            feed.entries[0].published,
            Some(Utc.with_ymd_and_hms(2003, 12, 13, 18, 30, 2).unwrap())
        );
    }

    const ATOM_UPDATED_ONLY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Updated Only</title>
  <link href="http://example.org/"/>
  <updated>2024-03-01T15:02:00Z</updated>
  <id>urn:example:feed</id>
  <entry>
    <title>A</title>
    <link href="http://example.org/a"/>
    <id>urn:example:a</id>
    <updated>2024-03-01T15:02:00Z</updated>
  </entry>
</feed>"#;

    const ATOM_LINK_RELS: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Link Rels</title>
  <link href="http://example.org/"/>
  <updated>2024-03-01T15:02:00Z</updated>
  <id>urn:example:feed</id>
  <entry>
    <title>B</title>
    <link rel="replies" href="http://example.org/b/comments"/>
    <link rel="alternate" href="http://example.org/b"/>
    <id>urn:example:b</id>
    <updated>2024-03-01T15:02:00Z</updated>
  </entry>
  <entry>
    <title>C</title>
    <link rel="enclosure" href="http://example.org/c.mp3"/>
    <id>urn:example:c</id>
    <updated>2024-03-01T15:02:00Z</updated>
  </entry>
</feed>"#;

    #[test]
    fn falls_back_to_updated_when_unpublished() {
        let feed = parse_feed(ATOM_UPDATED_ONLY.as_bytes()).unwrap();

        assert_eq!(feed.entries.len(), 1);
        assert_eq!(feed.entries[0].link, "http://example.org/a");
        assert_eq!(
            feed.entries[0].published,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 15, 2, 0).unwrap())
        );
    }

    #[test]
    fn entry_link_prefers_alternate() {
        let feed = parse_feed(ATOM_LINK_RELS.as_bytes()).unwrap();

        assert_eq!(feed.entries.len(), 2);
        assert_eq!(feed.entries[0].link, "http://example.org/b");
        // No alternate link at all: fall back to the first one.
        assert_eq!(feed.entries[1].link, "http://example.org/c.mp3");
    }

    #[test]
    fn rejects_garbage() {
        let err = parse_feed(b"definitely not a feed").unwrap_err();
        assert!(matches!(err, FeedError::Parse(_)));
    }
}
