pub mod commands;

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::client::TorrentFilter;

const STATE_FILTER_HELP: &str = "Info-hashes of torrents, or one state filter: \
     _all, _active, _done, _downloading, _seeding, _paused, _completed, _error";

#[derive(Parser)]
#[command(name = "ptool")]
#[command(about = "Private tracker and torrent client toolbox", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.config/ptool/ptool.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Torrent selection shared by every command acting on client torrents.
#[derive(Args, Debug, Clone)]
pub struct SelectArgs {
    /// Filter torrents by name (case-insensitive substring)
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Filter torrents by category
    #[arg(short, long)]
    pub category: Option<String>,

    /// Filter torrents by tag
    #[arg(short, long)]
    pub tag: Option<String>,

    #[arg(required = true, help = STATE_FILTER_HELP)]
    pub torrents: Vec<String>,
}

impl SelectArgs {
    pub fn torrent_filter(&self) -> TorrentFilter {
        TorrentFilter::new(self.category.clone(), self.tag.clone(), self.filter.clone())
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// List configured sites
    Sites,
    /// List configured clients
    Clients,
    /// Show the latest torrents of a site
    Latest {
        site: String,
        /// Listing page to scrape instead of the site's default one
        #[arg(long)]
        url: Option<String>,
        /// Only torrents published on or after this date (YYYY-MM-DD)
        #[arg(long)]
        since: Option<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Download a torrent file from a site
    Dltorrent {
        site: String,
        /// Download link, absolute or relative to the site
        url: String,
        /// Output file (default: <site>.<id>.torrent)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show torrents in a client
    Show {
        client: String,
        /// Filter torrents by name (case-insensitive substring)
        #[arg(short, long)]
        filter: Option<String>,
        /// Filter torrents by category
        #[arg(short, long)]
        category: Option<String>,
        /// Filter torrents by tag
        #[arg(short, long)]
        tag: Option<String>,
        #[arg(long)]
        json: bool,
        #[arg(help = STATE_FILTER_HELP)]
        torrents: Vec<String>,
    },
    /// Add torrents to a client
    Add {
        client: String,
        /// Torrent files, URLs or magnet links
        #[arg(required = true)]
        sources: Vec<String>,
        /// Download URLs through this site's session before adding
        #[arg(long)]
        site: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
        #[arg(long)]
        save_path: Option<String>,
        #[arg(long)]
        paused: bool,
    },
    /// Delete torrents from a client
    Delete {
        client: String,
        /// Also delete downloaded files
        #[arg(long)]
        delete_files: bool,
        #[command(flatten)]
        select: SelectArgs,
    },
    /// Pause torrents
    Pause {
        client: String,
        #[command(flatten)]
        select: SelectArgs,
    },
    /// Resume torrents
    Resume {
        client: String,
        #[command(flatten)]
        select: SelectArgs,
    },
    /// Force recheck of torrents
    Recheck {
        client: String,
        #[command(flatten)]
        select: SelectArgs,
    },
    /// Force reannounce of torrents
    Reannounce {
        client: String,
        #[command(flatten)]
        select: SelectArgs,
    },
    /// Add tags to torrents
    Addtags {
        client: String,
        /// Comma-separated tags
        tags: String,
        #[command(flatten)]
        select: SelectArgs,
    },
    /// Remove tags from torrents
    Removetags {
        client: String,
        /// Comma-separated tags
        tags: String,
        #[command(flatten)]
        select: SelectArgs,
    },
    /// Set category of torrents
    Setcategory {
        client: String,
        #[arg(value_name = "CATEGORY")]
        new_category: String,
        #[command(flatten)]
        select: SelectArgs,
    },
    /// Move torrents to a new save path
    Setsavepath {
        client: String,
        #[arg(value_name = "SAVE_PATH")]
        save_path: String,
        #[command(flatten)]
        select: SelectArgs,
    },
    /// List tags of a client
    Gettags { client: String },
    /// List categories of a client
    Getcategories { client: String },
    /// Create tags in a client
    Createtags {
        client: String,
        /// Comma-separated tags
        tags: String,
    },
    /// Delete tags from a client
    Deletetags {
        client: String,
        /// Comma-separated tags
        tags: String,
    },
    /// Replace a tracker of torrents
    Edittracker {
        client: String,
        #[arg(long)]
        old_tracker: String,
        #[arg(long)]
        new_tracker: String,
        /// Treat both trackers as host names and swap only the host part
        #[arg(long)]
        replace_host: bool,
        #[command(flatten)]
        select: SelectArgs,
    },
    /// Add trackers to torrents
    Addtrackers {
        client: String,
        #[arg(long = "tracker", required = true)]
        trackers: Vec<String>,
        #[command(flatten)]
        select: SelectArgs,
    },
    /// Remove trackers from torrents
    Removetrackers {
        client: String,
        #[arg(long = "tracker", required = true)]
        trackers: Vec<String>,
        #[command(flatten)]
        select: SelectArgs,
    },
}

/// Split a comma-separated list, dropping empty entries.
pub fn split_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
