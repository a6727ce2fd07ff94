use serde::{Deserialize, Serialize};

/// Backend-independent torrent state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TorrentState {
    Downloading,
    Seeding,
    /// Stopped before finishing.
    Paused,
    /// Stopped after finishing.
    Completed,
    Checking,
    Queued,
    Error,
    Unknown,
}

impl TorrentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Downloading => "downloading",
            Self::Seeding => "seeding",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Checking => "checking",
            Self::Queued => "queued",
            Self::Error => "error",
            Self::Unknown => "unknown",
        }
    }

    /// All content is on disk.
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Seeding | Self::Completed)
    }
}

impl std::fmt::Display for TorrentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
