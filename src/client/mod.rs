//! Torrent client capability contract.
//!
//! Each backend implements [`Client`] against its own API dialect. Bulk
//! operations come in two flavors: `*_torrents` taking an explicit hash list
//! and `*_all_torrents` acting on everything, which is what a
//! [`Selection::All`](selection::Selection::All) must be dispatched to.

pub mod qbittorrent;
pub mod selection;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::app::{PtoolError, Result};
use crate::config::ClientConfig;
use crate::domain::ClientTorrent;

pub use qbittorrent::QbittorrentClient;
pub use selection::{select_torrents, Selection, StateFilter, TorrentFilter};

/// What to add: raw `.torrent` content or a URL / magnet link the backend fetches itself.
#[derive(Debug, Clone, PartialEq)]
pub enum AddTorrentSource {
    Metainfo(Vec<u8>),
    Url(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddTorrentOptions {
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub save_path: Option<String>,
    pub paused: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TorrentTracker {
    pub url: String,
    pub status: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub save_path: String,
}

#[async_trait]
pub trait Client: Send + Sync {
    fn name(&self) -> &str;

    async fn get_torrents(&self) -> Result<Vec<ClientTorrent>>;

    async fn add_torrent(&self, source: AddTorrentSource, options: &AddTorrentOptions) -> Result<()>;

    async fn delete_torrents(&self, info_hashes: &[String], delete_files: bool) -> Result<()>;
    async fn delete_all_torrents(&self, delete_files: bool) -> Result<()>;

    async fn pause_torrents(&self, info_hashes: &[String]) -> Result<()>;
    async fn pause_all_torrents(&self) -> Result<()>;

    async fn resume_torrents(&self, info_hashes: &[String]) -> Result<()>;
    async fn resume_all_torrents(&self) -> Result<()>;

    async fn recheck_torrents(&self, info_hashes: &[String]) -> Result<()>;
    async fn recheck_all_torrents(&self) -> Result<()>;

    async fn reannounce_torrents(&self, info_hashes: &[String]) -> Result<()>;
    async fn reannounce_all_torrents(&self) -> Result<()>;

    async fn add_tags_to_torrents(&self, info_hashes: &[String], tags: &[String]) -> Result<()>;
    async fn add_tags_to_all_torrents(&self, tags: &[String]) -> Result<()>;

    async fn remove_tags_from_torrents(&self, info_hashes: &[String], tags: &[String]) -> Result<()>;
    async fn remove_tags_from_all_torrents(&self, tags: &[String]) -> Result<()>;

    async fn set_torrents_category(&self, info_hashes: &[String], category: &str) -> Result<()>;
    async fn set_all_torrents_category(&self, category: &str) -> Result<()>;

    /// Moves torrent data to `save_path`.
    async fn set_torrents_save_path(&self, info_hashes: &[String], save_path: &str) -> Result<()>;
    async fn set_all_torrents_save_path(&self, save_path: &str) -> Result<()>;

    async fn get_tags(&self) -> Result<Vec<String>>;
    async fn create_tags(&self, tags: &[String]) -> Result<()>;
    async fn delete_tags(&self, tags: &[String]) -> Result<()>;

    async fn get_categories(&self) -> Result<Vec<Category>>;

    async fn get_torrent_trackers(&self, info_hash: &str) -> Result<Vec<TorrentTracker>>;
    async fn edit_tracker(&self, info_hash: &str, old_url: &str, new_url: &str) -> Result<()>;
    async fn add_trackers(&self, info_hash: &str, urls: &[String]) -> Result<()>;
    async fn remove_trackers(&self, info_hash: &str, urls: &[String]) -> Result<()>;
}

pub type ClientConstructor = fn(ClientConfig) -> Result<Box<dyn Client>>;

/// Lookup table from backend identifier to constructor.
#[derive(Default)]
pub struct ClientRegistry {
    constructors: HashMap<String, ClientConstructor>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every backend shipped in this crate.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(qbittorrent::CLIENT_TYPE, QbittorrentClient::create);
        registry
    }

    pub fn register(&mut self, client_type: &str, constructor: ClientConstructor) {
        self.constructors.insert(client_type.to_string(), constructor);
    }

    pub fn create(&self, config: ClientConfig) -> Result<Box<dyn Client>> {
        let constructor = self
            .constructors
            .get(&config.client_type)
            .ok_or_else(|| PtoolError::UnsupportedClientType(config.client_type.clone()))?;
        constructor(config)
    }

    pub fn client_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }
}
