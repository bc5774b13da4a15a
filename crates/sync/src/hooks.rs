use async_trait::async_trait;
use feedsync_core::{FeedEntry, FeedInfo};
use feedsync_hooks::HookDispatcher;

/// Side effects to run after an entry was delivered.
#[async_trait]
pub trait ArticleHooks: Send + Sync {
    async fn new_article(&self, feed: &FeedInfo, entry: &FeedEntry);
}

#[async_trait]
impl ArticleHooks for HookDispatcher {
    async fn new_article(&self, feed: &FeedInfo, entry: &FeedEntry) {
        HookDispatcher::new_article(self, feed, entry).await
    }
}
