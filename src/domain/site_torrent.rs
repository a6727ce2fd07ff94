use serde::{Deserialize, Serialize};

/// One torrent listed on a tracker site page, normalized across site families.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteTorrent {
    pub name: String,
    pub download_url: String,
    /// Size in bytes, 0 when the page does not show it.
    pub size: i64,
    pub seeders: i64,
    pub leechers: i64,
    pub snatched: i64,
    /// Publish time as a Unix timestamp, 0 when unknown.
    pub time: i64,
    pub has_hnr: bool,
    /// 0.0 means free.
    pub download_multiplier: f64,
    pub upload_multiplier: f64,
    /// End of the discount window as a Unix timestamp, -1 when there is none.
    pub discount_end_time: i64,
    /// The tracker reports this torrent as currently seeding or downloading.
    pub is_active: bool,
}

impl SiteTorrent {
    pub fn new(name: String, download_url: String) -> Self {
        Self {
            name,
            download_url,
            size: 0,
            seeders: 0,
            leechers: 0,
            snatched: 0,
            time: 0,
            has_hnr: false,
            download_multiplier: 1.0,
            upload_multiplier: 1.0,
            discount_end_time: -1,
            is_active: false,
        }
    }

    pub fn is_free(&self) -> bool {
        self.download_multiplier == 0.0
    }
}
