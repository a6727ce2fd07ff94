//! qBittorrent backend speaking the Web API v2.
//!
//! The session cookie is obtained on first use and kept by reqwest's cookie
//! store for the lifetime of the client.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::REFERER;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::OnceCell;
use url::Url;

use crate::app::{PtoolError, Result};
use crate::client::{AddTorrentOptions, AddTorrentSource, Category, Client, TorrentTracker};
use crate::config::ClientConfig;
use crate::domain::{ClientTorrent, TorrentState};

pub const CLIENT_TYPE: &str = "qbittorrent";

const REQUEST_TIMEOUT_SECS: u64 = 30;
const LOGIN_OK: &str = "Ok.";
const ALL_HASHES: &str = "all";

pub struct QbittorrentClient {
    config: ClientConfig,
    base_url: Url,
    http: reqwest::Client,
    session: OnceCell<()>,
}

impl QbittorrentClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.url.is_empty() {
            return Err(PtoolError::InvalidArgument(format!(
                "client {} has no url",
                config.name
            )));
        }
        let base_url = if config.url.ends_with('/') {
            Url::parse(&config.url)?
        } else {
            Url::parse(&format!("{}/", config.url))?
        };

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .cookie_store(true)
            .build()?;

        Ok(Self {
            config,
            base_url,
            http,
            session: OnceCell::new(),
        })
    }

    pub fn create(config: ClientConfig) -> Result<Box<dyn Client>> {
        Ok(Box::new(Self::new(config)?))
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join("api/v2/")?.join(path)?)
    }

    async fn login(&self) -> Result<()> {
        self.session
            .get_or_try_init(|| async {
                let url = self.endpoint("auth/login")?;
                tracing::debug!("{}: logging in at {}", self.config.name, url);

                let response = self
                    .http
                    .post(url)
                    .header(REFERER, self.base_url.as_str())
                    .form(&[
                        ("username", self.config.username.as_str()),
                        ("password", self.config.password.as_str()),
                    ])
                    .send()
                    .await?;

                let status = response.status();
                let body = response.text().await?;
                if status != StatusCode::OK || body.trim() != LOGIN_OK {
                    return Err(PtoolError::backend(
                        &self.config.name,
                        format!("login failed: status={} body={}", status.as_u16(), body.trim()),
                    ));
                }
                Ok::<(), PtoolError>(())
            })
            .await
            .map(|_| ())
    }

    async fn send(&self, request: RequestBuilder) -> Result<String> {
        let response = request.header(REFERER, self.base_url.as_str()).send().await?;
        let status = response.status();
        let body = response.text().await?;
        tracing::trace!("{}: status={} body_len={}", self.config.name, status, body.len());

        if status != StatusCode::OK {
            return Err(PtoolError::backend(
                &self.config.name,
                format!("status={} body={}", status.as_u16(), body.trim()),
            ));
        }
        Ok(body)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        self.login().await?;
        let request = self.http.get(self.endpoint(path)?).query(query);
        let body = self.send(request).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Result<()> {
        self.login().await?;
        tracing::debug!("{}: POST {}", self.config.name, path);
        let request = self.http.post(self.endpoint(path)?).form(form);
        self.send(request).await.map(|_| ())
    }

    /// Newer releases renamed pause/resume to stop/start. Retry under the new
    /// name when the old endpoint is gone.
    async fn post_form_renamed(&self, path: &str, renamed: &str, form: &[(&str, &str)]) -> Result<()> {
        match self.post_form(path, form).await {
            Err(PtoolError::Backend { message, .. }) if message.starts_with("status=404") => {
                self.post_form(renamed, form).await
            }
            other => other,
        }
    }
}

fn join_hashes(info_hashes: &[String]) -> String {
    info_hashes.join("|")
}

#[async_trait]
impl Client for QbittorrentClient {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn get_torrents(&self) -> Result<Vec<ClientTorrent>> {
        let infos: Vec<TorrentInfo> = self.get_json("torrents/info", &[]).await?;
        Ok(infos.into_iter().map(ClientTorrent::from).collect())
    }

    async fn add_torrent(&self, source: AddTorrentSource, options: &AddTorrentOptions) -> Result<()> {
        self.login().await?;

        let mut form = match source {
            AddTorrentSource::Metainfo(bytes) => Form::new().part(
                "torrents",
                Part::bytes(bytes)
                    .file_name("file.torrent")
                    .mime_str("application/x-bittorrent")?,
            ),
            AddTorrentSource::Url(url) => Form::new().text("urls", url),
        };
        if let Some(category) = options.category.as_ref().filter(|c| !c.is_empty()) {
            form = form.text("category", category.clone());
        }
        if !options.tags.is_empty() {
            form = form.text("tags", options.tags.join(","));
        }
        if let Some(save_path) = options.save_path.as_ref().filter(|p| !p.is_empty()) {
            form = form.text("savepath", save_path.clone());
        }
        if options.paused {
            // Both spellings, older and newer releases each read one.
            form = form.text("paused", "true").text("stopped", "true");
        }

        let request = self.http.post(self.endpoint("torrents/add")?).multipart(form);
        let body = self.send(request).await?;
        if body.trim().eq_ignore_ascii_case("fails.") {
            return Err(PtoolError::backend(&self.config.name, "torrent was rejected"));
        }
        Ok(())
    }

    async fn delete_torrents(&self, info_hashes: &[String], delete_files: bool) -> Result<()> {
        let hashes = join_hashes(info_hashes);
        let delete_files = delete_files.to_string();
        self.post_form(
            "torrents/delete",
            &[("hashes", hashes.as_str()), ("deleteFiles", delete_files.as_str())],
        )
        .await
    }

    async fn delete_all_torrents(&self, delete_files: bool) -> Result<()> {
        let delete_files = delete_files.to_string();
        self.post_form(
            "torrents/delete",
            &[("hashes", ALL_HASHES), ("deleteFiles", delete_files.as_str())],
        )
        .await
    }

    async fn pause_torrents(&self, info_hashes: &[String]) -> Result<()> {
        let hashes = join_hashes(info_hashes);
        self.post_form_renamed("torrents/pause", "torrents/stop", &[("hashes", hashes.as_str())])
            .await
    }

    async fn pause_all_torrents(&self) -> Result<()> {
        self.post_form_renamed("torrents/pause", "torrents/stop", &[("hashes", ALL_HASHES)])
            .await
    }

    async fn resume_torrents(&self, info_hashes: &[String]) -> Result<()> {
        let hashes = join_hashes(info_hashes);
        self.post_form_renamed("torrents/resume", "torrents/start", &[("hashes", hashes.as_str())])
            .await
    }

    async fn resume_all_torrents(&self) -> Result<()> {
        self.post_form_renamed("torrents/resume", "torrents/start", &[("hashes", ALL_HASHES)])
            .await
    }

    async fn recheck_torrents(&self, info_hashes: &[String]) -> Result<()> {
        let hashes = join_hashes(info_hashes);
        self.post_form("torrents/recheck", &[("hashes", hashes.as_str())]).await
    }

    async fn recheck_all_torrents(&self) -> Result<()> {
        self.post_form("torrents/recheck", &[("hashes", ALL_HASHES)]).await
    }

    async fn reannounce_torrents(&self, info_hashes: &[String]) -> Result<()> {
        let hashes = join_hashes(info_hashes);
        self.post_form("torrents/reannounce", &[("hashes", hashes.as_str())]).await
    }

    async fn reannounce_all_torrents(&self) -> Result<()> {
        self.post_form("torrents/reannounce", &[("hashes", ALL_HASHES)]).await
    }

    async fn add_tags_to_torrents(&self, info_hashes: &[String], tags: &[String]) -> Result<()> {
        let hashes = join_hashes(info_hashes);
        let tags = tags.join(",");
        self.post_form("torrents/addTags", &[("hashes", hashes.as_str()), ("tags", tags.as_str())])
            .await
    }

    async fn add_tags_to_all_torrents(&self, tags: &[String]) -> Result<()> {
        let tags = tags.join(",");
        self.post_form("torrents/addTags", &[("hashes", ALL_HASHES), ("tags", tags.as_str())])
            .await
    }

    async fn remove_tags_from_torrents(&self, info_hashes: &[String], tags: &[String]) -> Result<()> {
        let hashes = join_hashes(info_hashes);
        let tags = tags.join(",");
        self.post_form("torrents/removeTags", &[("hashes", hashes.as_str()), ("tags", tags.as_str())])
            .await
    }

    async fn remove_tags_from_all_torrents(&self, tags: &[String]) -> Result<()> {
        let tags = tags.join(",");
        self.post_form("torrents/removeTags", &[("hashes", ALL_HASHES), ("tags", tags.as_str())])
            .await
    }

    async fn set_torrents_category(&self, info_hashes: &[String], category: &str) -> Result<()> {
        let hashes = join_hashes(info_hashes);
        self.post_form(
            "torrents/setCategory",
            &[("hashes", hashes.as_str()), ("category", category)],
        )
        .await
    }

    async fn set_all_torrents_category(&self, category: &str) -> Result<()> {
        self.post_form(
            "torrents/setCategory",
            &[("hashes", ALL_HASHES), ("category", category)],
        )
        .await
    }

    async fn set_torrents_save_path(&self, info_hashes: &[String], save_path: &str) -> Result<()> {
        let hashes = join_hashes(info_hashes);
        self.post_form(
            "torrents/setLocation",
            &[("hashes", hashes.as_str()), ("location", save_path)],
        )
        .await
    }

    async fn set_all_torrents_save_path(&self, save_path: &str) -> Result<()> {
        self.post_form(
            "torrents/setLocation",
            &[("hashes", ALL_HASHES), ("location", save_path)],
        )
        .await
    }

    async fn get_tags(&self) -> Result<Vec<String>> {
        let mut tags: Vec<String> = self.get_json("torrents/tags", &[]).await?;
        tags.sort();
        Ok(tags)
    }

    async fn create_tags(&self, tags: &[String]) -> Result<()> {
        let tags = tags.join(",");
        self.post_form("torrents/createTags", &[("tags", tags.as_str())]).await
    }

    async fn delete_tags(&self, tags: &[String]) -> Result<()> {
        let tags = tags.join(",");
        self.post_form("torrents/deleteTags", &[("tags", tags.as_str())]).await
    }

    async fn get_categories(&self) -> Result<Vec<Category>> {
        let categories: HashMap<String, CategoryInfo> =
            self.get_json("torrents/categories", &[]).await?;
        Ok(categories_from(categories))
    }

    async fn get_torrent_trackers(&self, info_hash: &str) -> Result<Vec<TorrentTracker>> {
        let trackers: Vec<TrackerInfo> = self
            .get_json("torrents/trackers", &[("hash", info_hash)])
            .await?;
        Ok(trackers
            .into_iter()
            .filter(|t| !t.is_pseudo())
            .map(TorrentTracker::from)
            .collect())
    }

    async fn edit_tracker(&self, info_hash: &str, old_url: &str, new_url: &str) -> Result<()> {
        self.post_form(
            "torrents/editTracker",
            &[("hash", info_hash), ("origUrl", old_url), ("newUrl", new_url)],
        )
        .await
    }

    async fn add_trackers(&self, info_hash: &str, urls: &[String]) -> Result<()> {
        let urls = urls.join("\n");
        self.post_form("torrents/addTrackers", &[("hash", info_hash), ("urls", urls.as_str())])
            .await
    }

    async fn remove_trackers(&self, info_hash: &str, urls: &[String]) -> Result<()> {
        let urls = urls.join("|");
        self.post_form("torrents/removeTrackers", &[("hash", info_hash), ("urls", urls.as_str())])
            .await
    }
}

/// Entry of `/api/v2/torrents/info`.
#[derive(Debug, Deserialize)]
struct TorrentInfo {
    hash: String,
    name: String,
    state: String,
    #[serde(default)]
    category: String,
    /// Comma separated.
    #[serde(default)]
    tags: String,
    #[serde(default)]
    save_path: String,
    #[serde(default)]
    tracker: String,
    #[serde(default)]
    size: i64,
    #[serde(default)]
    progress: f64,
    #[serde(default)]
    dlspeed: i64,
    #[serde(default)]
    upspeed: i64,
    #[serde(default)]
    added_on: i64,
}

impl From<TorrentInfo> for ClientTorrent {
    fn from(info: TorrentInfo) -> Self {
        ClientTorrent {
            info_hash: info.hash.to_lowercase(),
            name: info.name,
            state: map_state(&info.state),
            category: info.category,
            tags: split_tags(&info.tags),
            save_path: info.save_path,
            tracker: info.tracker,
            size: info.size,
            progress: info.progress,
            download_speed: info.dlspeed,
            upload_speed: info.upspeed,
            added_at: info.added_on,
        }
    }
}

fn split_tags(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

fn map_state(state: &str) -> TorrentState {
    match state {
        "downloading" | "forcedDL" | "metaDL" | "forcedMetaDL" | "stalledDL" => {
            TorrentState::Downloading
        }
        "uploading" | "forcedUP" | "stalledUP" => TorrentState::Seeding,
        "queuedDL" | "queuedUP" => TorrentState::Queued,
        "pausedDL" | "stoppedDL" => TorrentState::Paused,
        "pausedUP" | "stoppedUP" => TorrentState::Completed,
        "checkingDL" | "checkingUP" | "checkingResumeData" | "moving" | "allocating" => {
            TorrentState::Checking
        }
        "error" | "missingFiles" => TorrentState::Error,
        _ => TorrentState::Unknown,
    }
}

#[derive(Debug, Deserialize)]
struct CategoryInfo {
    #[serde(default)]
    name: String,
    #[serde(default, rename = "savePath")]
    save_path: String,
}

fn categories_from(categories: HashMap<String, CategoryInfo>) -> Vec<Category> {
    let mut list: Vec<Category> = categories
        .into_iter()
        .map(|(key, info)| Category {
            name: if info.name.is_empty() { key } else { info.name },
            save_path: info.save_path,
        })
        .collect();
    list.sort_by(|a, b| a.name.cmp(&b.name));
    list
}

/// Entry of `/api/v2/torrents/trackers`.
#[derive(Debug, Deserialize)]
struct TrackerInfo {
    url: String,
    #[serde(default)]
    status: i64,
    #[serde(default)]
    msg: String,
}

impl TrackerInfo {
    /// DHT, PeX and LSD are listed as `** [DHT] **` style rows.
    fn is_pseudo(&self) -> bool {
        self.url.starts_with("** [")
    }
}

impl From<TrackerInfo> for TorrentTracker {
    fn from(info: TrackerInfo) -> Self {
        let status = match info.status {
            0 => "disabled",
            1 => "not contacted",
            2 => "working",
            3 => "updating",
            4 => "not working",
            _ => "unknown",
        };
        TorrentTracker {
            url: info.url,
            status: status.to_string(),
            message: info.msg,
        }
    }
}
