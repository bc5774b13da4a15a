//! Feed synchronization pipeline.
//!
//! Fetches every configured feed in parallel, keeps the entries nobody has
//! claimed before, orders them by publication time and delivers them one by
//! one to a bookmark service, running hooks and recording each success.

pub mod bookmark;
pub mod hooks;
pub mod pipeline;
pub mod source;

pub use bookmark::{BookmarkError, BookmarkSink, InstapaperClient};
pub use hooks::ArticleHooks;
pub use pipeline::{NewEntry, Processor, RunSummary};
pub use source::{FeedError, FeedSource, HttpFeedSource};
