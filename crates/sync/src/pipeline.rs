//! One synchronization run: fetch, claim, merge, order, deliver.

use std::sync::Arc;

use feedsync_core::{FeedEntry, FeedInfo};
use feedsync_state::ProcessedState;
use futures::future::join_all;
use tracing::{debug, error, info, warn};

use crate::bookmark::BookmarkSink;
use crate::hooks::ArticleHooks;
use crate::source::{FeedError, FeedSource};

/// An entry claimed during this run, tagged with the feed it came from.
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub feed: Arc<FeedInfo>,
    pub entry: FeedEntry,
}

/// Counters describing how a run went.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Sources whose fetch or parse failed.
    pub sources_failed: usize,
    /// Entries claimed for the first time.
    pub new_entries: usize,
    pub delivered: usize,
    /// Entries the bookmark sink rejected.
    pub failed: usize,
}

/// Drives a single run of the synchronization pipeline.
pub struct Processor {
    source: Arc<dyn FeedSource>,
    sink: Arc<dyn BookmarkSink>,
    hooks: Arc<dyn ArticleHooks>,
    state: Arc<ProcessedState>,
    dry_run: bool,
}

impl Processor {
    pub fn new(
        source: Arc<dyn FeedSource>,
        sink: Arc<dyn BookmarkSink>,
        hooks: Arc<dyn ArticleHooks>,
        state: Arc<ProcessedState>,
    ) -> Self {
        Self {
            source,
            sink,
            hooks,
            state,
            dry_run: false,
        }
    }

    /// Claim and order entries but skip delivery, hooks and recording.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run the pipeline over `urls`.
    ///
    /// Per-source and per-entry failures are logged and counted; the run
    /// itself never fails. Flushing the state is left to the caller.
    pub async fn process_feeds(&self, urls: &[String]) -> RunSummary {
        let mut summary = RunSummary::default();
        let entries = self.collect_new_entries(urls, &mut summary).await;
        summary.new_entries = entries.len();

        info!(
            sources = urls.len(),
            new_entries = entries.len(),
            dry_run = self.dry_run,
            "collected new entries"
        );

        if self.dry_run {
            for new in &entries {
                info!(
                    link = %new.entry.link,
                    title = %new.entry.title,
                    feed = %new.feed.title,
                    "would add entry"
                );
            }
            return summary;
        }

        for new in entries {
            match self.sink.add(&new.entry.link, &new.entry.title).await {
                Ok(()) => {
                    info!(
                        link = %new.entry.link,
                        title = %new.entry.title,
                        sink = self.sink.name(),
                        "added entry"
                    );
                    self.hooks.new_article(&new.feed, &new.entry).await;
                    self.state.record(new.entry.link);
                    summary.delivered += 1;
                }
                Err(e) => {
                    warn!(
                        link = %new.entry.link,
                        sink = self.sink.name(),
                        error = %e,
                        "failed to add entry"
                    );
                    summary.failed += 1;
                }
            }
        }

        summary
    }

    /// Fetch every source concurrently and return the newly claimed entries
    /// in delivery order.
    async fn collect_new_entries(&self, urls: &[String], summary: &mut RunSummary) -> Vec<NewEntry> {
        let tasks = urls.iter().cloned().map(|url| {
            let source = Arc::clone(&self.source);
            let state = Arc::clone(&self.state);
            tokio::spawn(async move {
                let result = fetch_and_claim(source.as_ref(), &state, &url).await;
                (url, result)
            })
        });

        // join_all keeps source order, which makes discovery order stable.
        let mut merged = Vec::new();
        for joined in join_all(tasks).await {
            match joined {
                Ok((_, Ok(entries))) => merged.extend(entries),
                Ok((url, Err(e))) => {
                    warn!(url = %url, error = %e, "failed to fetch feed");
                    summary.sources_failed += 1;
                }
                Err(e) => {
                    error!(error = %e, "feed task panicked");
                    summary.sources_failed += 1;
                }
            }
        }

        // Stable: equal timestamps keep discovery order, undated entries go first.
        merged.sort_by_key(|new| new.entry.published);
        merged
    }
}

async fn fetch_and_claim(
    source: &dyn FeedSource,
    state: &ProcessedState,
    url: &str,
) -> Result<Vec<NewEntry>, FeedError> {
    let feed = source.fetch(url).await?;
    let info = Arc::new(feed.info());
    let total = feed.entries.len();

    let claimed: Vec<NewEntry> = feed
        .entries
        .into_iter()
        .filter(|entry| state.claim(&entry.link))
        .map(|entry| NewEntry {
            feed: Arc::clone(&info),
            entry,
        })
        .collect();

    debug!(url, total, new = claimed.len(), "fetched feed");
    Ok(claimed)
}
