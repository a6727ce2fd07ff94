use std::path::PathBuf;
use std::sync::Arc;

use crate::app::error::{PtoolError, Result};
use crate::client::{Client, ClientRegistry};
use crate::config::Config;
use crate::fetcher::{Fetcher, HttpFetcher};
use crate::site::{Site, SiteRegistry};

pub struct AppContext {
    pub config: Config,
    pub sites: SiteRegistry,
    pub clients: ClientRegistry,
    pub fetcher: Arc<dyn Fetcher + Send + Sync>,
}

impl AppContext {
    /// Load configuration from `config_path`, or the default location when `None`.
    pub fn new(config_path: Option<PathBuf>) -> Result<Self> {
        let config = match config_path {
            Some(path) => Config::load_from(&path)?,
            None => Config::load()?,
        };
        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::new()?);
        Ok(Self::with_parts(config, fetcher))
    }

    pub fn with_parts(config: Config, fetcher: Arc<dyn Fetcher + Send + Sync>) -> Self {
        Self {
            config,
            sites: SiteRegistry::with_builtin(),
            clients: ClientRegistry::with_builtin(),
            fetcher,
        }
    }

    pub fn create_site(&self, name: &str) -> Result<Box<dyn Site>> {
        let config = self
            .config
            .site(name)
            .ok_or_else(|| PtoolError::UnknownSite(name.to_string()))?;
        if config.disabled {
            return Err(PtoolError::DisabledSite(name.to_string()));
        }
        tracing::debug!("creating site {} of type {}", name, config.site_type);
        self.sites.create(config, self.fetcher.clone())
    }

    pub fn create_client(&self, name: &str) -> Result<Box<dyn Client>> {
        let config = self
            .config
            .client(name)
            .ok_or_else(|| PtoolError::UnknownClient(name.to_string()))?;
        tracing::debug!("creating client {} of type {}", name, config.client_type);
        self.clients.create(config)
    }
}
