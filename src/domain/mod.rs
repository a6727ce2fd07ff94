pub mod client_torrent;
pub mod site_torrent;
pub mod state;

pub use client_torrent::ClientTorrent;
pub use site_torrent::SiteTorrent;
pub use state::TorrentState;
