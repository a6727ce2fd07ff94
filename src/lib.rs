//! # ptool
//!
//! A command-line toolbox for private BitTorrent trackers and torrent clients.
//!
//! ## Architecture
//!
//! ```text
//! Fetcher → Site (scraper) → SiteTorrent
//! Client backend → ClientTorrent → Selection → bulk operation
//! ```
//!
//! - [`site`]: scrapes tracker listing pages into normalized records
//! - [`client`]: drives torrent client daemons through their web APIs
//!
//! ## Quick Start
//!
//! ```bash
//! # Latest torrents of a configured site
//! ptool latest mysite
//!
//! # Pause every seeding torrent tagged "old"
//! ptool pause local -t old _seeding
//!
//! # Add a tag to two torrents
//! ptool addtags local keep <infohash> <infohash>
//! ```
//!
//! ## Modules
//!
//! - [`app`]: Application context and error types
//! - [`cli`]: Command-line interface definitions
//! - [`client`]: Client contract, registry, selection, qBittorrent backend
//! - [`config`]: TOML configuration
//! - [`domain`]: Core models (SiteTorrent, ClientTorrent, TorrentState)
//! - [`fetcher`]: HTTP page fetching
//! - [`html`]: DOM extraction helpers
//! - [`site`]: Site contract, registry, NexusPHP scraper
//! - [`util`]: Time, duration and size parsing

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) owns the configuration, the site and
/// client registries and the shared fetcher.
pub mod app;

/// Command-line interface using clap.
pub mod cli;

/// Torrent client capability contract and backends.
///
/// - [`Client`](client::Client): operations every backend supports
/// - [`ClientRegistry`](client::ClientRegistry): backend identifier to constructor
/// - [`select_torrents`](client::select_torrents): hashes / state filter resolution
pub mod client;

/// Configuration management.
///
/// Loads from `~/.config/ptool/ptool.toml`, with `[site_defaults]` and
/// `[client_defaults]` filling fields left empty by individual entries.
pub mod config;

/// Core domain models.
pub mod domain;

/// HTTP fetching with browser-like headers and per-site cookies.
pub mod fetcher;

pub mod html;

/// Tracker site capability contract and scrapers.
///
/// - [`Site`](site::Site): listing scrape and torrent download
/// - [`SiteRegistry`](site::SiteRegistry): site family to constructor
/// - [`NexusPhpSite`](site::NexusPhpSite): NexusPHP listing scraper
pub mod site;

pub mod util;
