//! Tracker site capability contract.
//!
//! Every site family implements [`Site`]. Callers obtain instances through a
//! [`SiteRegistry`], which maps a family identifier (the `type` field of a
//! site's configuration) to a constructor.
//!
//! ```rust,ignore
//! let registry = SiteRegistry::with_builtin();
//! let site = registry.create(site_config, fetcher)?;
//! let torrents = site.get_latest_torrents(None).await?;
//! ```

pub mod nexusphp;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::app::{PtoolError, Result};
use crate::config::SiteConfig;
use crate::domain::SiteTorrent;
use crate::fetcher::Fetcher;

pub use nexusphp::NexusPhpSite;

#[async_trait]
pub trait Site: Send + Sync {
    fn name(&self) -> &str;

    fn config(&self) -> &SiteConfig;

    /// Download a `.torrent` file using the site's session.
    async fn download_torrent(&self, url: &str) -> Result<Vec<u8>>;

    /// Scrape a listing page. `None` uses the site's default listing page.
    async fn get_latest_torrents(&self, url: Option<&str>) -> Result<Vec<SiteTorrent>>;
}

pub type SiteConstructor = fn(SiteConfig, Arc<dyn Fetcher + Send + Sync>) -> Result<Box<dyn Site>>;

/// Lookup table from site family identifier to constructor.
#[derive(Default)]
pub struct SiteRegistry {
    constructors: HashMap<String, SiteConstructor>,
}

impl SiteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every site family shipped in this crate.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(nexusphp::SITE_TYPE, NexusPhpSite::create);
        registry
    }

    pub fn register(&mut self, site_type: &str, constructor: SiteConstructor) {
        self.constructors.insert(site_type.to_string(), constructor);
    }

    pub fn create(
        &self,
        config: SiteConfig,
        fetcher: Arc<dyn Fetcher + Send + Sync>,
    ) -> Result<Box<dyn Site>> {
        let constructor = self
            .constructors
            .get(&config.site_type)
            .ok_or_else(|| PtoolError::UnsupportedSiteType(config.site_type.clone()))?;
        constructor(config, fetcher)
    }

    pub fn site_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }
}
