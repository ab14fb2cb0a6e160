pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::aggregate::DEFAULT_WORKERS;
use crate::daemon::parse_minutes;

#[derive(Parser)]
#[command(name = "novelrank")]
#[command(about = "Aggregated novel rankings from several book sites", long_about = None)]
pub struct Cli {
    /// Maximum provider requests in flight (default: from config, else 10)
    #[arg(short, long, global = true)]
    pub workers: Option<usize>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Update the rankings if they are missing or stale
    Refresh {
        /// Update even if the rankings are still fresh
        #[arg(short, long)]
        force: bool,
    },
    /// Show the ranked novels
    List {
        /// Category to show ("all" for every category)
        #[arg(short, long)]
        category: Option<String>,

        /// Don't update stale rankings first
        #[arg(long)]
        cached: bool,

        /// Print the rankings as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show cache and settings diagnostics
    Status,
    /// Open a ranked novel in the browser
    Open {
        /// Rank as shown by `list` (1-based)
        rank: usize,

        /// Category the rank refers to (default: last listed category)
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Drop the cached rankings
    Clear,
    /// Show or change user settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// List the built-in sources and their categories
    Sources,
    /// Keep the rankings fresh in the foreground until interrupted
    Daemon {
        /// Check interval (e.g., "30m", "1h"; default: from config)
        #[arg(short, long, value_parser = parse_minutes)]
        every: Option<u64>,

        /// Skip the check on start
        #[arg(long)]
        no_initial_update: bool,

        /// Log file path (default: stdout)
        #[arg(short, long)]
        log: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print the current settings
    Show,
    /// Change one or more settings
    Set {
        /// Enabled sources, comma separated (e.g., "goodreads,douban")
        #[arg(long, value_delimiter = ',')]
        sources: Option<Vec<String>>,

        /// Hours before the rankings go stale
        #[arg(long)]
        interval: Option<u64>,

        /// Category shown when none was chosen before
        #[arg(long)]
        default_category: Option<String>,

        #[arg(long)]
        show_rating: Option<bool>,

        #[arg(long)]
        show_author: Option<bool>,

        #[arg(long)]
        show_category: Option<bool>,
    },
}

impl Cli {
    pub fn workers_or(&self, configured: usize) -> usize {
        match self.workers {
            Some(0) | None if configured > 0 => configured,
            Some(w) if w > 0 => w,
            _ => DEFAULT_WORKERS,
        }
    }
}
