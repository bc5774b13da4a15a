use std::path::PathBuf;

use clap::Parser;

/// Deliver new feed entries to Instapaper.
///
/// Fetches every configured feed, adds entries not seen before to
/// Instapaper in publication order and runs the configured hooks for each.
#[derive(Parser, Debug)]
#[command(name = "feedsync", version, about = "Deliver new feed entries to Instapaper")]
pub struct CliArgs {
    /// Path to config file (default: ~/.config/feeds-to-instapaper/config.toml)
    #[arg(long, env = "FEEDSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Path to the state file (default: ~/.local/state/feeds-to-instapaper/added)
    #[arg(long, env = "FEEDSYNC_STATE")]
    pub state: Option<PathBuf>,

    /// Fetch and order new entries without adding them or running hooks
    #[arg(long)]
    pub dry_run: bool,
}
