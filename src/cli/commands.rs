use std::path::{Path, PathBuf};

use url::Url;

use crate::app::{AppContext, PtoolError, Result};
use crate::cli::SelectArgs;
use crate::client::{
    select_torrents, AddTorrentOptions, AddTorrentSource, Client, Selection, TorrentFilter,
};
use crate::domain::{ClientTorrent, SiteTorrent};
use crate::site::Site;
use crate::util::time::{format_time, parse_local_date};
use crate::util::{format_size, hostname_of};

pub fn list_sites(ctx: &AppContext) {
    if ctx.config.sites.is_empty() {
        println!("No sites configured");
        return;
    }
    for site in &ctx.config.sites {
        let site = site.merged_over(&ctx.config.site_defaults);
        let disabled = if site.disabled { " (disabled)" } else { "" };
        println!("{:<16} {:<10} {}{}", site.name, site.site_type, site.url, disabled);
    }
}

pub fn list_clients(ctx: &AppContext) {
    if ctx.config.clients.is_empty() {
        println!("No clients configured");
        return;
    }
    for client in &ctx.config.clients {
        let client = client.merged_over(&ctx.config.client_defaults);
        println!("{:<16} {:<12} {}", client.name, client.client_type, client.url);
    }
}

pub async fn latest(site: &dyn Site, url: Option<&str>, since: Option<&str>, json: bool) -> Result<()> {
    let mut torrents = site.get_latest_torrents(url).await?;
    if let Some(since) = since {
        let since = parse_local_date(since)?;
        torrents.retain(|t| t.time >= since);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&torrents)?);
        return Ok(());
    }

    if torrents.is_empty() {
        println!("No torrents");
        return Ok(());
    }
    println!(
        "{:<60} {:>10} {:>6} {:>6} {:>6} {:<19} {:<10}",
        "Name", "Size", "Seed", "Leech", "Done", "Time", "Flags"
    );
    for torrent in &torrents {
        println!(
            "{:<60} {:>10} {:>6} {:>6} {:>6} {:<19} {:<10}",
            truncate(&torrent.name, 60),
            format_size(torrent.size),
            torrent.seeders,
            torrent.leechers,
            torrent.snatched,
            format_time(torrent.time),
            site_flags(torrent)
        );
    }
    println!("{} torrents", torrents.len());
    Ok(())
}

fn site_flags(torrent: &SiteTorrent) -> String {
    let mut flags = Vec::new();
    if torrent.is_free() {
        flags.push("free".to_string());
    } else if torrent.download_multiplier < 1.0 {
        flags.push(format!("{:.0}%", torrent.download_multiplier * 100.0));
    }
    if torrent.upload_multiplier > 1.0 {
        flags.push(format!("{}x", torrent.upload_multiplier));
    }
    if torrent.has_hnr {
        flags.push("hnr".to_string());
    }
    if torrent.is_active {
        flags.push("active".to_string());
    }
    flags.join(",")
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}

pub async fn download_torrent(site: &dyn Site, url: &str, output: Option<PathBuf>) -> Result<()> {
    let content = site.download_torrent(url).await?;
    let output = output.unwrap_or_else(|| default_torrent_filename(site.name(), url));
    std::fs::write(&output, &content)?;
    println!("Saved {} ({} bytes)", output.display(), content.len());
    Ok(())
}

/// `<site>.<id>.torrent`, using the `id` query parameter of the download link when present.
fn default_torrent_filename(site: &str, url: &str) -> PathBuf {
    let id = Url::parse("http://localhost/")
        .and_then(|base| base.join(url))
        .ok()
        .and_then(|u| {
            u.query_pairs()
                .find(|(key, _)| key == "id")
                .map(|(_, value)| value.into_owned())
        })
        .filter(|id| !id.is_empty());
    match id {
        Some(id) => PathBuf::from(format!("{}.{}.torrent", site, id)),
        None => PathBuf::from(format!("{}.torrent", site)),
    }
}

pub async fn show(client: &dyn Client, filter: &TorrentFilter, args: &[String], json: bool) -> Result<()> {
    let torrents: Vec<ClientTorrent> = match select_torrents(client, filter, args).await? {
        Selection::All => client.get_torrents().await?,
        Selection::None => Vec::new(),
        Selection::Specific(hashes) => client
            .get_torrents()
            .await?
            .into_iter()
            .filter(|t| hashes.contains(&t.info_hash))
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&torrents)?);
        return Ok(());
    }

    if torrents.is_empty() {
        println!("No torrents");
        return Ok(());
    }
    for torrent in &torrents {
        println!(
            "{}  {:<11} {:>10} {:>5.1}%  {}",
            torrent.info_hash,
            torrent.state.as_str(),
            format_size(torrent.size),
            torrent.progress * 100.0,
            truncate(&torrent.name, 60)
        );
        println!(
            "    category={} tags={} tracker={} added={} down={}/s up={}/s",
            torrent.category,
            torrent.tags.join(","),
            hostname_of(&torrent.tracker),
            format_time(torrent.added_at),
            format_size(torrent.download_speed),
            format_size(torrent.upload_speed)
        );
    }
    println!("{} torrents", torrents.len());
    Ok(())
}

pub async fn add(
    client: &dyn Client,
    site: Option<&dyn Site>,
    sources: &[String],
    options: &AddTorrentOptions,
) -> Result<()> {
    let mut added = 0;
    let mut errors = 0;

    for source in sources {
        let result = match resolve_source(site, source).await {
            Ok(source) => client.add_torrent(source, options).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => {
                added += 1;
                tracing::info!("{}: added {}", client.name(), source);
            }
            Err(e) => {
                errors += 1;
                eprintln!("  Error adding {}: {}", source, e);
            }
        }
    }

    println!("Added {} torrents, {} errors", added, errors);
    if errors > 0 {
        return Err(PtoolError::backend(
            client.name(),
            format!("{} of {} torrents failed", errors, sources.len()),
        ));
    }
    Ok(())
}

async fn resolve_source(site: Option<&dyn Site>, source: &str) -> Result<AddTorrentSource> {
    if source.starts_with("magnet:") {
        return Ok(AddTorrentSource::Url(source.to_string()));
    }
    if let Some(site) = site {
        return Ok(AddTorrentSource::Metainfo(site.download_torrent(source).await?));
    }
    if source.starts_with("http://") || source.starts_with("https://") {
        return Ok(AddTorrentSource::Url(source.to_string()));
    }
    Ok(AddTorrentSource::Metainfo(std::fs::read(Path::new(source))?))
}

/// A bulk operation with an explicit-list and an everything form.
#[derive(Debug, Clone, PartialEq)]
pub enum TorrentAction {
    Delete { delete_files: bool },
    Pause,
    Resume,
    Recheck,
    Reannounce,
    AddTags(Vec<String>),
    RemoveTags(Vec<String>),
    SetCategory(String),
    SetSavePath(String),
}

impl TorrentAction {
    async fn apply(&self, client: &dyn Client, hashes: &[String]) -> Result<()> {
        match self {
            Self::Delete { delete_files } => client.delete_torrents(hashes, *delete_files).await,
            Self::Pause => client.pause_torrents(hashes).await,
            Self::Resume => client.resume_torrents(hashes).await,
            Self::Recheck => client.recheck_torrents(hashes).await,
            Self::Reannounce => client.reannounce_torrents(hashes).await,
            Self::AddTags(tags) => client.add_tags_to_torrents(hashes, tags).await,
            Self::RemoveTags(tags) => client.remove_tags_from_torrents(hashes, tags).await,
            Self::SetCategory(category) => client.set_torrents_category(hashes, category).await,
            Self::SetSavePath(path) => client.set_torrents_save_path(hashes, path).await,
        }
    }

    async fn apply_all(&self, client: &dyn Client) -> Result<()> {
        match self {
            Self::Delete { delete_files } => client.delete_all_torrents(*delete_files).await,
            Self::Pause => client.pause_all_torrents().await,
            Self::Resume => client.resume_all_torrents().await,
            Self::Recheck => client.recheck_all_torrents().await,
            Self::Reannounce => client.reannounce_all_torrents().await,
            Self::AddTags(tags) => client.add_tags_to_all_torrents(tags).await,
            Self::RemoveTags(tags) => client.remove_tags_from_all_torrents(tags).await,
            Self::SetCategory(category) => client.set_all_torrents_category(category).await,
            Self::SetSavePath(path) => client.set_all_torrents_save_path(path).await,
        }
    }
}

/// Resolve the selection and run `action` once: in bulk, on the listed hashes, or not at all.
pub async fn apply_action(client: &dyn Client, select: &SelectArgs, action: &TorrentAction) -> Result<()> {
    let selection = select_torrents(client, &select.torrent_filter(), &select.torrents).await?;
    match selection {
        Selection::All => {
            action.apply_all(client).await?;
            tracing::info!("{}: {:?} applied to all torrents", client.name(), action);
        }
        Selection::None => {
            tracing::warn!("{}: no torrents matched", client.name());
        }
        Selection::Specific(hashes) => {
            action.apply(client, &hashes).await?;
            tracing::info!("{}: {:?} applied to {} torrents", client.name(), action, hashes.len());
        }
    }
    Ok(())
}

pub async fn get_tags(client: &dyn Client) -> Result<()> {
    for tag in client.get_tags().await? {
        println!("{}", tag);
    }
    Ok(())
}

pub async fn get_categories(client: &dyn Client) -> Result<()> {
    for category in client.get_categories().await? {
        println!("{:<24} {}", category.name, category.save_path);
    }
    Ok(())
}

/// Tracker edits apply to one torrent at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerAction {
    Edit {
        old_tracker: String,
        new_tracker: String,
        replace_host: bool,
    },
    Add(Vec<String>),
    Remove(Vec<String>),
}

pub async fn apply_tracker_action(
    client: &dyn Client,
    select: &SelectArgs,
    action: &TrackerAction,
) -> Result<()> {
    let hashes = select_torrents(client, &select.torrent_filter(), &select.torrents)
        .await?
        .into_hashes(client)
        .await?;
    if hashes.is_empty() {
        tracing::warn!("{}: no torrents matched", client.name());
        return Ok(());
    }

    let mut changed = 0;
    let mut errors = 0;
    for hash in &hashes {
        match apply_tracker_action_to(client, hash, action).await {
            Ok(true) => changed += 1,
            Ok(false) => tracing::debug!("{}: {} left unchanged", client.name(), hash),
            Err(e) => {
                errors += 1;
                eprintln!("  Error updating trackers of {}: {}", hash, e);
            }
        }
    }

    println!("Updated {} of {} torrents, {} errors", changed, hashes.len(), errors);
    if errors > 0 {
        return Err(PtoolError::backend(
            client.name(),
            format!("{} torrents failed", errors),
        ));
    }
    Ok(())
}

async fn apply_tracker_action_to(client: &dyn Client, hash: &str, action: &TrackerAction) -> Result<bool> {
    match action {
        TrackerAction::Add(urls) => {
            client.add_trackers(hash, urls).await?;
            Ok(true)
        }
        TrackerAction::Remove(urls) => {
            client.remove_trackers(hash, urls).await?;
            Ok(true)
        }
        TrackerAction::Edit {
            old_tracker,
            new_tracker,
            replace_host,
        } => {
            let trackers = client.get_torrent_trackers(hash).await?;
            let mut edited = false;
            for tracker in trackers {
                let replacement = if *replace_host {
                    replace_tracker_host(&tracker.url, old_tracker, new_tracker)
                } else if &tracker.url == old_tracker {
                    Some(new_tracker.clone())
                } else {
                    None
                };
                if let Some(new_url) = replacement {
                    client.edit_tracker(hash, &tracker.url, &new_url).await?;
                    edited = true;
                }
            }
            Ok(edited)
        }
    }
}

/// `url` with its host swapped to `new_host` when it currently is `old_host`.
fn replace_tracker_host(url: &str, old_host: &str, new_host: &str) -> Option<String> {
    if hostname_of(url) != old_host {
        return None;
    }
    let mut parsed = Url::parse(url).ok()?;
    parsed.set_host(Some(new_host)).ok()?;
    Some(parsed.to_string())
}
