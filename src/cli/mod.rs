pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "feedstash")]
#[command(about = "Poll RSS/Atom feeds into SQLite and export a JSONL snapshot", long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Config file (default: ~/.config/feedstash/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Poll feeds and store new items
    Poll {
        /// RSS/Atom feed URL (repeatable; defaults to the configured feeds)
        #[arg(long = "url")]
        urls: Vec<String>,

        /// Polling interval (e.g. "300", "5m", "1h")
        #[arg(short, long)]
        interval: Option<String>,

        /// SQLite database path
        #[arg(long)]
        db: Option<PathBuf>,

        /// JSONL snapshot path (default: rss_items.jsonl beside the database)
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Fetch once and exit
        #[arg(long)]
        once: bool,
    },
    /// Export stored items to a JSONL file
    Export {
        /// SQLite database path
        #[arg(long)]
        db: Option<PathBuf>,

        /// Output JSONL path
        #[arg(long)]
        out: Option<PathBuf>,

        /// Only items fetched at or after this ISO timestamp, e.g. 2025-10-25T00:00:00Z
        #[arg(long)]
        since: Option<String>,

        /// Maximum number of rows to export
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show or create the config file
    Config {
        /// Write a commented default config file
        #[arg(long)]
        init: bool,
    },
}
