mod cli;
mod config;
mod shutdown;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::info;

use feedsync_hooks::HookDispatcher;
use feedsync_state::ProcessedState;
use feedsync_sync::{HttpFeedSource, InstapaperClient, Processor};

use crate::cli::CliArgs;
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Before anything else, so RUST_LOG and FEEDSYNC_* can come from .env.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    let config = Config::load(args.config.as_deref()).context("failed to load configuration")?;

    let state_path = match args.state {
        Some(path) => path,
        None => ProcessedState::default_path()?,
    };
    let state = Arc::new(
        ProcessedState::load(&state_path)
            .with_context(|| format!("failed to load state: {}", state_path.display()))?,
    );

    let hooks = HookDispatcher::new(&config.hooks).context("invalid hook configuration")?;
    info!(
        feeds = config.feeds.urls.len(),
        hooks = hooks.len(),
        dry_run = args.dry_run,
        "Starting feed sync"
    );

    shutdown::flush_on_signal(state.clone());

    let timeout = config.request_timeout();
    let sink = InstapaperClient::new(
        config.instapaper.username.clone(),
        config.instapaper.password.clone(),
        timeout,
    );
    let processor = Processor::new(
        Arc::new(HttpFeedSource::new(timeout)),
        Arc::new(sink),
        Arc::new(hooks),
        state.clone(),
    )
    .dry_run(args.dry_run);

    let summary = processor.process_feeds(&config.feeds.urls).await;
    info!(
        new_entries = summary.new_entries,
        delivered = summary.delivered,
        failed = summary.failed,
        sources_failed = summary.sources_failed,
        "Feed sync finished"
    );

    let saved = state
        .flush()
        .with_context(|| format!("failed to save state: {}", state.path().display()))?;
    info!(saved, path = %state.path().display(), "state saved");

    Ok(())
}
