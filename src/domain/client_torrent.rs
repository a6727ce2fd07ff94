use serde::{Deserialize, Serialize};

use crate::domain::TorrentState;

/// A torrent as reported by a client backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientTorrent {
    /// Lowercase hex info-hash.
    pub info_hash: String,
    pub name: String,
    pub state: TorrentState,
    pub category: String,
    pub tags: Vec<String>,
    pub save_path: String,
    /// Tracker currently used by the backend, may be empty.
    pub tracker: String,
    pub size: i64,
    /// Download progress in `0.0..=1.0`.
    pub progress: f64,
    pub download_speed: i64,
    pub upload_speed: i64,
    pub added_at: i64,
}

impl ClientTorrent {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Data is currently flowing in either direction.
    pub fn is_active(&self) -> bool {
        self.download_speed > 0 || self.upload_speed > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn torrent() -> ClientTorrent {
        ClientTorrent {
            info_hash: "0123456789abcdef0123456789abcdef01234567".into(),
            name: "Example".into(),
            state: TorrentState::Seeding,
            category: "linux".into(),
            tags: vec!["iso".into(), "keep".into()],
            save_path: "/data".into(),
            tracker: String::new(),
            size: 1024,
            progress: 1.0,
            download_speed: 0,
            upload_speed: 0,
            added_at: 0,
        }
    }

    #[test]
    fn test_has_tag_is_exact() {
        let t = torrent();
        assert!(t.has_tag("iso"));
        assert!(!t.has_tag("is"));
    }

    #[test]
    fn test_is_active_follows_speeds() {
        let mut t = torrent();
        assert!(!t.is_active());
        t.upload_speed = 10;
        assert!(t.is_active());
    }
}
