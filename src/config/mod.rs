//! Configuration management for ptool.
//!
//! Configuration is read from `~/.config/ptool/ptool.toml` unless another
//! path is given. If the default file doesn't exist, a commented template is
//! created and an empty configuration is used.

pub mod client;
pub mod site;

pub use client::ClientConfig;
pub use site::SiteConfig;

use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Values applied to every `[[sites]]` entry that leaves them unset.
    pub site_defaults: SiteConfig,
    /// Values applied to every `[[clients]]` entry that leaves them unset.
    pub client_defaults: ClientConfig,
    pub sites: Vec<SiteConfig>,
    pub clients: Vec<ClientConfig>,
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// If the config file exists but is invalid, returns an error.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, which must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/ptool/ptool.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("ptool").join("ptool.toml"))
    }

    /// Site entry by name with `site_defaults` applied.
    pub fn site(&self, name: &str) -> Option<SiteConfig> {
        self.sites
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.merged_over(&self.site_defaults))
    }

    /// Client entry by name with `client_defaults` applied.
    pub fn client(&self, name: &str) -> Option<ClientConfig> {
        self.clients
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.merged_over(&self.client_defaults))
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        r##"# ptool configuration
#
# Sites are tracker websites scraped for torrent listings.
# Clients are torrent client daemons controlled through their web API.

# Fields here apply to every site that leaves them empty.
[site_defaults]
# timezone = "+08:00"

# [[sites]]
# name = "mysite"
# type = "nexusphp"
# url = "https://tracker.example.org/"
# cookie = "uid=...; pass=..."
# torrents_url = "https://tracker.example.org/torrents.php"

[client_defaults]

# [[clients]]
# name = "local"
# type = "qbittorrent"
# url = "http://localhost:8080/"
# username = "admin"
# password = "adminadmin"
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },
}
