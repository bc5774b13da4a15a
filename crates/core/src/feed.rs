use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of an entry: its canonical link, compared byte for byte.
pub type EntryId = String;

/// A single entry as handed over by a feed parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub link: EntryId,
    pub title: String,
    pub published: Option<DateTime<Utc>>,
}

impl FeedEntry {
    pub fn new(link: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            title: title.into(),
            published: None,
        }
    }

    pub fn published_at(mut self, published: DateTime<Utc>) -> Self {
        self.published = Some(published);
        self
    }
}

/// A parsed feed snapshot. Read-only once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feed {
    pub title: String,
    pub link: String,
    pub entries: Vec<FeedEntry>,
}

impl Feed {
    /// Title and link of this feed, without its entries.
    pub fn info(&self) -> FeedInfo {
        FeedInfo {
            title: self.title.clone(),
            link: self.link.clone(),
        }
    }
}

/// The originating feed of an entry, as exposed to hooks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedInfo {
    pub title: String,
    pub link: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn info_drops_entries() {
        let feed = Feed {
            title: "Example".to_string(),
            link: "https://example.com/".to_string(),
            entries: vec![FeedEntry::new("https://example.com/1", "One")],
        };

        let info = feed.info();
        assert_eq!(info.title, "Example");
        assert_eq!(info.link, "https://example.com/");
    }

    #[test]
    fn entry_builder_sets_published() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 15, 2, 0).unwrap();
        let entry = FeedEntry::new("https://example.com/2", "Two").published_at(at);
        assert_eq!(entry.published, Some(at));
    }
}
