//! Resolve command arguments into the set of torrents to act on.
//!
//! Arguments are either literal info-hashes or exactly one state keyword
//! (`_all`, `_active`, `_done`, `_downloading`, `_seeding`, `_paused`,
//! `_completed`, `_error`). The outcome distinguishes three cases:
//!
//! - [`Selection::All`]: every torrent, to be handled by an `*_all_torrents` call
//! - [`Selection::None`]: nothing matched, nothing to do
//! - [`Selection::Specific`]: exactly these hashes

use crate::app::{PtoolError, Result};
use crate::client::Client;
use crate::domain::{ClientTorrent, TorrentState};
use crate::util::contains_i;

const INFO_HASH_LEN: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateFilter {
    All,
    Active,
    Done,
    Downloading,
    Seeding,
    Paused,
    Completed,
    Error,
}

impl StateFilter {
    pub const KEYWORDS: [&'static str; 8] = [
        "_all",
        "_active",
        "_done",
        "_downloading",
        "_seeding",
        "_paused",
        "_completed",
        "_error",
    ];

    pub fn parse(keyword: &str) -> Option<Self> {
        match keyword {
            "_all" => Some(Self::All),
            "_active" => Some(Self::Active),
            "_done" => Some(Self::Done),
            "_downloading" => Some(Self::Downloading),
            "_seeding" => Some(Self::Seeding),
            "_paused" => Some(Self::Paused),
            "_completed" => Some(Self::Completed),
            "_error" => Some(Self::Error),
            _ => None,
        }
    }

    pub fn matches(&self, torrent: &ClientTorrent) -> bool {
        match self {
            Self::All => true,
            Self::Active => torrent.is_active(),
            Self::Done => torrent.state.is_complete(),
            Self::Downloading => torrent.state == TorrentState::Downloading,
            Self::Seeding => torrent.state == TorrentState::Seeding,
            Self::Paused => torrent.state == TorrentState::Paused,
            Self::Completed => torrent.state == TorrentState::Completed,
            Self::Error => torrent.state == TorrentState::Error,
        }
    }
}

/// Conjunctive torrent filters. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TorrentFilter {
    pub category: Option<String>,
    pub tag: Option<String>,
    /// Case-insensitive name substring.
    pub name: Option<String>,
}

impl TorrentFilter {
    /// Build a filter, treating empty strings as unset.
    pub fn new(category: Option<String>, tag: Option<String>, name: Option<String>) -> Self {
        let set = |v: Option<String>| v.filter(|s| !s.is_empty());
        Self {
            category: set(category),
            tag: set(tag),
            name: set(name),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.tag.is_none() && self.name.is_none()
    }

    pub fn matches(&self, torrent: &ClientTorrent) -> bool {
        if let Some(category) = &self.category {
            if &torrent.category != category {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            if !torrent.has_tag(tag) {
                return false;
            }
        }
        if let Some(name) = &self.name {
            if !contains_i(&torrent.name, name) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    All,
    None,
    Specific(Vec<String>),
}

impl Selection {
    pub fn from_hashes(hashes: Vec<String>) -> Self {
        if hashes.is_empty() {
            Self::None
        } else {
            Self::Specific(hashes)
        }
    }

    /// Concrete hash list, listing the client when every torrent is selected.
    pub async fn into_hashes(self, client: &dyn Client) -> Result<Vec<String>> {
        match self {
            Self::All => Ok(client
                .get_torrents()
                .await?
                .into_iter()
                .map(|t| t.info_hash)
                .collect()),
            Self::None => Ok(Vec::new()),
            Self::Specific(hashes) => Ok(hashes),
        }
    }
}

pub fn is_info_hash(text: &str) -> bool {
    text.len() == INFO_HASH_LEN && hex::decode(text).is_ok()
}

enum Target {
    State(StateFilter),
    Hashes(Vec<String>),
}

fn parse_args(args: &[String]) -> Result<Target> {
    if args.is_empty() {
        return Ok(Target::State(StateFilter::All));
    }

    if let Some(keyword) = args.iter().find(|a| a.starts_with('_')) {
        let state = StateFilter::parse(keyword).ok_or_else(|| {
            PtoolError::InvalidArgument(format!(
                "unknown state filter {}, expected one of {}",
                keyword,
                StateFilter::KEYWORDS.join(", ")
            ))
        })?;
        if args.len() > 1 {
            return Err(PtoolError::InvalidArgument(
                "a state filter cannot be combined with other info-hashes or state filters".into(),
            ));
        }
        return Ok(Target::State(state));
    }

    let mut hashes: Vec<String> = Vec::with_capacity(args.len());
    for arg in args {
        if !is_info_hash(arg) {
            return Err(PtoolError::InvalidArgument(format!("invalid info-hash {}", arg)));
        }
        let hash = arg.to_lowercase();
        if !hashes.contains(&hash) {
            hashes.push(hash);
        }
    }
    Ok(Target::Hashes(hashes))
}

/// Resolve `args` against the client's listing.
///
/// `_all` without any filter returns [`Selection::All`] without listing the
/// client. Hashes absent from the listing are dropped silently.
pub async fn select_torrents(
    client: &dyn Client,
    filter: &TorrentFilter,
    args: &[String],
) -> Result<Selection> {
    let target = parse_args(args)?;

    if matches!(target, Target::State(StateFilter::All)) && filter.is_empty() {
        return Ok(Selection::All);
    }

    let torrents = client.get_torrents().await?;

    let hashes: Vec<String> = match target {
        Target::State(state) => torrents
            .iter()
            .filter(|t| state.matches(t) && filter.matches(t))
            .map(|t| t.info_hash.clone())
            .collect(),
        Target::Hashes(wanted) => wanted
            .into_iter()
            .filter(|hash| {
                torrents
                    .iter()
                    .any(|t| t.info_hash.eq_ignore_ascii_case(hash) && filter.matches(t))
            })
            .collect(),
    };

    tracing::debug!("{}: selected {} of {} torrents", client.name(), hashes.len(), torrents.len());
    Ok(Selection::from_hashes(hashes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::MockClient;

    const DEADBEEF: &str = "deadbeefdeadbeefdeadbeefdeadbeefdeadbeef";
    const CAFEBABE: &str = "cafebabecafebabecafebabecafebabecafebabe";
    const F00D: &str = "f00df00df00df00df00df00df00df00df00df00d";

    fn torrent(hash: &str, name: &str, state: TorrentState) -> ClientTorrent {
        ClientTorrent {
            info_hash: hash.into(),
            name: name.into(),
            state,
            category: String::new(),
            tags: Vec::new(),
            save_path: "/downloads".into(),
            tracker: String::new(),
            size: 0,
            progress: 0.0,
            download_speed: 0,
            upload_speed: 0,
            added_at: 0,
        }
    }

    fn client() -> MockClient {
        let mut seeding = torrent(DEADBEEF, "Ubuntu 24.04", TorrentState::Seeding);
        seeding.category = "linux".into();
        seeding.tags = vec!["iso".into()];
        seeding.upload_speed = 2048;

        let mut paused = torrent(F00D, "Debian 12", TorrentState::Paused);
        paused.category = "linux".into();

        let errored = torrent(
            "0123456789abcdef0123456789abcdef01234567",
            "Broken",
            TorrentState::Error,
        );

        MockClient::with_torrents(vec![seeding, paused, errored])
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn select(client: &MockClient, filter: &TorrentFilter, values: &[&str]) -> Result<Selection> {
        tokio_test::block_on(select_torrents(client, filter, &args(values)))
    }

    #[test]
    fn test_all_without_filters_is_sentinel() {
        let client = client();
        let selection = select(&client, &TorrentFilter::default(), &["_all"]).unwrap();
        assert_eq!(selection, Selection::All);
        assert_eq!(*client.listings.lock().unwrap(), 0);
    }

    #[test]
    fn test_no_args_is_all() {
        let client = client();
        assert_eq!(select(&client, &TorrentFilter::default(), &[]).unwrap(), Selection::All);
    }

    #[test]
    fn test_all_with_filter_lists_matches() {
        let client = client();
        let filter = TorrentFilter::new(Some("linux".into()), None, None);
        let selection = select(&client, &filter, &["_all"]).unwrap();
        assert_eq!(selection, Selection::Specific(args(&[DEADBEEF, F00D])));
    }

    #[test]
    fn test_unknown_hashes_are_dropped() {
        let client = client();
        let selection = select(&client, &TorrentFilter::default(), &[DEADBEEF, CAFEBABE]).unwrap();
        assert_eq!(selection, Selection::Specific(args(&[DEADBEEF])));
    }

    #[test]
    fn test_no_match_is_none_not_all() {
        let client = client();
        let selection = select(&client, &TorrentFilter::default(), &[CAFEBABE]).unwrap();
        assert_eq!(selection, Selection::None);

        let filter = TorrentFilter::new(None, Some("missing".into()), None);
        assert_eq!(select(&client, &filter, &["_seeding"]).unwrap(), Selection::None);
    }

    #[test]
    fn test_hashes_are_case_insensitive_and_deduplicated() {
        let client = client();
        let upper = DEADBEEF.to_uppercase();
        let selection =
            select(&client, &TorrentFilter::default(), &[upper.as_str(), DEADBEEF]).unwrap();
        assert_eq!(selection, Selection::Specific(args(&[DEADBEEF])));
    }

    #[test]
    fn test_hashes_intersect_with_filters() {
        let client = client();
        let filter = TorrentFilter::new(None, Some("iso".into()), Some("ubuntu".into()));
        let selection = select(&client, &filter, &[DEADBEEF, F00D]).unwrap();
        assert_eq!(selection, Selection::Specific(args(&[DEADBEEF])));
    }

    #[test]
    fn test_state_keywords() {
        let client = client();
        let none = TorrentFilter::default();
        assert_eq!(select(&client, &none, &["_active"]).unwrap(), Selection::Specific(args(&[DEADBEEF])));
        assert_eq!(select(&client, &none, &["_paused"]).unwrap(), Selection::Specific(args(&[F00D])));
        assert_eq!(select(&client, &none, &["_done"]).unwrap(), Selection::Specific(args(&[DEADBEEF])));
        assert_eq!(select(&client, &none, &["_downloading"]).unwrap(), Selection::None);
        assert_eq!(
            select(&client, &none, &["_error"]).unwrap(),
            Selection::Specific(args(&["0123456789abcdef0123456789abcdef01234567"]))
        );
    }

    #[test]
    fn test_invalid_arguments() {
        let client = client();
        let none = TorrentFilter::default();
        assert!(matches!(select(&client, &none, &["_bogus"]), Err(PtoolError::InvalidArgument(_))));
        assert!(matches!(select(&client, &none, &["_all", DEADBEEF]), Err(PtoolError::InvalidArgument(_))));
        assert!(matches!(select(&client, &none, &["_active", "_paused"]), Err(PtoolError::InvalidArgument(_))));
        assert!(matches!(select(&client, &none, &["abc"]), Err(PtoolError::InvalidArgument(_))));
    }

    #[test]
    fn test_empty_filter_strings_are_unset() {
        let filter = TorrentFilter::new(Some(String::new()), Some(String::new()), None);
        assert!(filter.is_empty());
    }

    #[test]
    fn test_into_hashes() {
        let client = client();
        let all = tokio_test::block_on(Selection::All.into_hashes(&client)).unwrap();
        assert_eq!(all.len(), 3);
        let none = tokio_test::block_on(Selection::None.into_hashes(&client)).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_is_info_hash() {
        assert!(is_info_hash(DEADBEEF));
        assert!(!is_info_hash("deadbeef"));
        assert!(!is_info_hash("zzzzbeefdeadbeefdeadbeefdeadbeefdeadbeef"));
    }
}
