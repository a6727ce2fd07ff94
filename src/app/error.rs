use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum PtoolError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to fetch {url}: status={status}")]
    Status { url: String, status: u16 },

    #[error("Page parse error: {0}")]
    Parse(String),

    #[error("Client {client} rejected request: {message}")]
    Backend { client: String, message: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid time: {0}")]
    InvalidTime(String),

    #[error("Invalid size: {0}")]
    InvalidSize(String),

    #[error("Site not found: {0}")]
    UnknownSite(String),

    #[error("Site is disabled: {0}")]
    DisabledSite(String),

    #[error("Client not found: {0}")]
    UnknownClient(String),

    #[error("Unsupported site type: {0}")]
    UnsupportedSiteType(String),

    #[error("Unsupported client type: {0}")]
    UnsupportedClientType(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl PtoolError {
    pub fn backend(client: &str, message: impl Into<String>) -> Self {
        Self::Backend {
            client: client.to_string(),
            message: message.into(),
        }
    }

    /// Whether the error came from the transport layer (connection, timeout, non-200).
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Status { .. })
    }
}

pub type Result<T> = std::result::Result<T, PtoolError>;
