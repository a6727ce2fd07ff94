//! NexusPHP site family.
//!
//! NexusPHP trackers render their listing as `table.torrents`, whose first row
//! is the header. Column order differs between installations, so the header is
//! scanned for the icons marking each column (`<img alt="size">` etc.) before
//! the data rows are read.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use chrono::FixedOffset;
use regex::Regex;
use scraper::{ElementRef, Html};
use url::Url;

use crate::app::{PtoolError, Result};
use crate::config::SiteConfig;
use crate::domain::SiteTorrent;
use crate::fetcher::Fetcher;
use crate::html::{element_text, has_match, parse_selector, select_first};
use crate::site::Site;
use crate::util::time::{parse_future_time, parse_time};
use crate::util::{parse_int, parse_size};

pub const SITE_TYPE: &str = "nexusphp";

const ROWS_SELECTOR: &str = "table.torrents > tbody > tr";
const TITLE_SELECTOR: &str = r#"a[href^="details.php?"]"#;
const DOWNLOAD_SELECTOR: &str = r#"a[href^="download.php?"]"#;
const HNR_SELECTOR: &str = r#"[title="H&R"],[alt="H&R"]"#;
const FREE_SELECTOR: &str =
    r#"[title="免费"],[title="免費"],[title="Free"],[alt="Free"],img.pro_free,img.pro_free2up"#;
const ACTIVE_SELECTOR: &str =
    r#"[title^="seeding"],[title^="leeching"],[title^="downloading"],[title^="uploading"]"#;

/// Header labels of the m-team style progress column.
const PROGRESS_LABELS: &[&str] = &["进度", "進度"];

/// Cloudflare email obfuscation placeholders. Cloudflare rewrites anything
/// shaped like an address, which includes release names such as
/// `Album-DIY@Audies`.
const EMAIL_PROTECTION_ARTIFACTS: &[&str] = &["[email protected]", "[email\u{a0}protected]"];

/// Partial promotions as (selector, download multiplier, upload multiplier).
/// The first matching entry applies.
const PROMOTIONS: &[(&str, f64, f64)] = &[
    ("img.pro_free2up", 1.0, 2.0),
    ("img.pro_50pctdown2up", 0.5, 2.0),
    ("img.pro_2up", 1.0, 2.0),
    ("img.pro_50pctdown", 0.5, 1.0),
    ("img.pro_30pctdown", 0.3, 1.0),
];

static PROGRESS_VALUE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+(\.\d+)?%").unwrap());

static DISCOUNT_REMAINING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:剩余|剩餘)(?:时间|時間)?\s*(?:：|:)\s*(?P<time>[YMDHSymdhsw年月周週天日小时時分钟鐘秒0-9]+)",
    )
    .unwrap()
});

/// Listing columns located through their header icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Time,
    Size,
    Seeders,
    Leechers,
    Snatched,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::Time,
        Field::Size,
        Field::Seeders,
        Field::Leechers,
        Field::Snatched,
    ];

    /// `alt` text of the header icon marking this column.
    pub fn marker(&self) -> &'static str {
        match self {
            Field::Time => "time",
            Field::Size => "size",
            Field::Seeders => "seeders",
            Field::Leechers => "leechers",
            Field::Snatched => "snatched",
        }
    }
}

/// Column position of each [`Field`], resolved once per page from the header row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnFieldIndex {
    columns: [Option<usize>; 5],
    /// Column whose percentage value marks a row as active.
    pub progress: Option<usize>,
}

impl ColumnFieldIndex {
    pub fn from_header(header: ElementRef<'_>) -> Self {
        let mut index = Self::default();

        for (column, cell) in header.children().filter_map(ElementRef::wrap).enumerate() {
            for field in Field::ALL {
                if index.get(field).is_some() {
                    continue;
                }
                if has_match(cell, &format!(r#"[alt="{}"]"#, field.marker())) {
                    index.columns[field as usize] = Some(column);
                    break;
                }
            }

            if index.progress.is_none() && PROGRESS_LABELS.contains(&element_text(cell).as_str()) {
                index.progress = Some(column);
            }
        }

        index
    }

    pub fn get(&self, field: Field) -> Option<usize> {
        self.columns[field as usize]
    }

    /// Field shown in `column`, if any.
    pub fn field_at(&self, column: usize) -> Option<Field> {
        Field::ALL.into_iter().find(|f| self.get(*f) == Some(column))
    }
}

pub struct NexusPhpSite {
    config: SiteConfig,
    base_url: Url,
    offset: Option<FixedOffset>,
    fetcher: Arc<dyn Fetcher + Send + Sync>,
}

impl NexusPhpSite {
    pub fn new(config: SiteConfig, fetcher: Arc<dyn Fetcher + Send + Sync>) -> Result<Self> {
        let base_url = Url::parse(&config.base_url())?;
        let offset = config.offset()?;
        Ok(Self {
            config,
            base_url,
            offset,
            fetcher,
        })
    }

    pub fn create(
        config: SiteConfig,
        fetcher: Arc<dyn Fetcher + Send + Sync>,
    ) -> Result<Box<dyn Site>> {
        Ok(Box::new(Self::new(config, fetcher)?))
    }

    fn cookie(&self) -> Option<&str> {
        Some(self.config.cookie.as_str()).filter(|c| !c.is_empty())
    }
}

#[async_trait]
impl Site for NexusPhpSite {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn config(&self) -> &SiteConfig {
        &self.config
    }

    async fn download_torrent(&self, url: &str) -> Result<Vec<u8>> {
        let url = self.base_url.join(url)?;
        self.fetcher.fetch(url.as_str(), self.cookie()).await
    }

    async fn get_latest_torrents(&self, url: Option<&str>) -> Result<Vec<SiteTorrent>> {
        let url = match url {
            Some(url) => url.to_string(),
            None => self.config.torrents_url(),
        };

        let body = self.fetcher.fetch(&url, self.cookie()).await?;
        let page = String::from_utf8_lossy(&body);
        let torrents = parse_torrents(&page, &self.base_url, self.offset.as_ref())?;
        tracing::debug!("{}: parsed {} torrents from {}", self.config.name, torrents.len(), url);
        Ok(torrents)
    }
}

/// Extract every torrent row of a NexusPHP listing page.
///
/// Fails only when the listing table is missing. Rows without a name or a
/// download link are skipped, unreadable cells keep their default value.
pub fn parse_torrents(
    page: &str,
    base_url: &Url,
    offset: Option<&FixedOffset>,
) -> Result<Vec<SiteTorrent>> {
    let document = Html::parse_document(page);
    let rows_selector = parse_selector(ROWS_SELECTOR)
        .ok_or_else(|| PtoolError::Parse(format!("invalid selector {}", ROWS_SELECTOR)))?;
    let mut rows = document.select(&rows_selector);

    let header = rows.next().ok_or_else(|| {
        PtoolError::Parse("no torrents found in page, possible a parser error".into())
    })?;
    let index = ColumnFieldIndex::from_header(header);
    tracing::trace!("column index {:?}", index);

    Ok(rows
        .filter_map(|row| parse_row(row, &index, base_url, offset))
        .collect())
}

fn parse_row(
    row: ElementRef<'_>,
    index: &ColumnFieldIndex,
    base_url: &Url,
    offset: Option<&FixedOffset>,
) -> Option<SiteTorrent> {
    let name = select_first(row, TITLE_SELECTOR)
        .map(|a| {
            EMAIL_PROTECTION_ARTIFACTS
                .iter()
                .fold(element_text(a), |name, artifact| name.replace(artifact, ""))
                .trim()
                .to_string()
        })
        .filter(|name| !name.is_empty())?;
    let download_url = select_first(row, DOWNLOAD_SELECTOR)
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| base_url.join(href).ok())?;

    let mut torrent = SiteTorrent::new(name, download_url.to_string());

    for (column, cell) in row.children().filter_map(ElementRef::wrap).enumerate() {
        if index.progress == Some(column) {
            if PROGRESS_VALUE.is_match(&element_text(cell)) {
                torrent.is_active = true;
            }
            continue;
        }
        match index.field_at(column) {
            Some(Field::Size) => torrent.size = parse_size(&element_text(cell)).unwrap_or(0),
            Some(Field::Seeders) => torrent.seeders = parse_int(&element_text(cell)),
            Some(Field::Leechers) => torrent.leechers = parse_int(&element_text(cell)),
            Some(Field::Snatched) => torrent.snatched = parse_int(&element_text(cell)),
            Some(Field::Time) => torrent.time = parse_time_cell(cell, offset),
            None => {}
        }
    }

    if let Some((_, download, upload)) = PROMOTIONS.iter().find(|(s, _, _)| has_match(row, s)) {
        torrent.download_multiplier = *download;
        torrent.upload_multiplier = *upload;
    }
    if has_match(row, FREE_SELECTOR) {
        torrent.download_multiplier = 0.0;
    }
    torrent.has_hnr = has_match(row, HNR_SELECTOR);
    if has_match(row, ACTIVE_SELECTOR) {
        torrent.is_active = true;
    }

    let row_text: String = row.text().collect();
    if let Some(remaining) = DISCOUNT_REMAINING.captures(&row_text) {
        torrent.discount_end_time = parse_future_time(&remaining["time"]).unwrap_or(-1);
    }

    Some(torrent)
}

/// The `title` attribute holds the full timestamp while the visible text is
/// often shortened to "3天前", so the attribute is tried first.
fn parse_time_cell(cell: ElementRef<'_>, offset: Option<&FixedOffset>) -> i64 {
    select_first(cell, "[title]")
        .and_then(|e| e.value().attr("title"))
        .and_then(|title| parse_time(title, offset).ok())
        .or_else(|| parse_time(&element_text(cell), offset).ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::testing::StaticFetcher;
    use crate::util::time::now;

    const BASE: &str = "https://pt.example.org/";

    const HEADER: &str = r#"
        <tr>
            <td class="colhead">Type</td>
            <td class="colhead">Name</td>
            <td class="colhead"><img class="time" src="pic/trans.gif" alt="time" title="Time"></td>
            <td class="colhead"><img class="size" src="pic/trans.gif" alt="size" title="Size"></td>
            <td class="colhead"><img class="seeders" src="pic/trans.gif" alt="seeders"></td>
            <td class="colhead"><img class="leechers" src="pic/trans.gif" alt="leechers"></td>
            <td class="colhead"><img class="snatched" src="pic/trans.gif" alt="snatched"></td>
            <td class="colhead">进度</td>
        </tr>
    "#;

    fn page(header: &str, rows: &str) -> String {
        format!(
            r#"<html><body>
            <table class="torrents"><tbody>{}{}</tbody></table>
            </body></html>"#,
            header, rows
        )
    }

    fn row(name_cell: &str, time_cell: &str, progress: &str) -> String {
        format!(
            r#"<tr>
                <td><img alt="Movies"></td>
                <td>{}</td>
                <td>{}</td>
                <td>1.5<br>GB</td>
                <td>1,234</td>
                <td>5</td>
                <td>100</td>
                <td>{}</td>
            </tr>"#,
            name_cell, time_cell, progress
        )
    }

    fn base() -> Url {
        Url::parse(BASE).unwrap()
    }

    #[test]
    fn test_full_row() {
        let rows = row(
            r#"<table class="torrentname"><tr><td>
                <a href="details.php?id=1&amp;hit=1" title="Ubuntu 24.04"><b>Ubuntu 24.04</b></a>
                <img class="pro_free" src="pic/trans.gif" alt="Free">
                <img src="pic/hit_run.gif" alt="H&amp;R" title="H&amp;R">
                <span>剩余时间：1天2时</span>
            </td><td><a href="download.php?id=1"><img alt="download"></a></td></tr></table>"#,
            r#"<span title="2023-08-01 09:30:00">1年</span>"#,
            "45.5%",
        );
        let offset = FixedOffset::east_opt(8 * 3600).unwrap();

        let before = now();
        let torrents = parse_torrents(&page(HEADER, &rows), &base(), Some(&offset)).unwrap();
        let after = now();

        assert_eq!(torrents.len(), 1);
        let t = &torrents[0];
        assert_eq!(t.name, "Ubuntu 24.04");
        assert_eq!(t.download_url, "https://pt.example.org/download.php?id=1");
        assert_eq!(t.size, 1_610_612_736);
        assert_eq!(t.seeders, 1234);
        assert_eq!(t.leechers, 5);
        assert_eq!(t.snatched, 100);
        // 2023-08-01T01:30:00Z
        assert_eq!(t.time, 1_690_853_400);
        assert!(t.has_hnr);
        assert_eq!(t.download_multiplier, 0.0);
        assert_eq!(t.upload_multiplier, 1.0);
        assert!(t.is_active);
        let window = 86400 + 2 * 3600;
        assert!(t.discount_end_time >= before + window && t.discount_end_time <= after + window);
    }

    #[test]
    fn test_time_text_fallback_repairs_concatenation() {
        let rows = row(
            r#"<a href="details.php?id=2">Debian</a> <a href="download.php?id=2">dl</a>"#,
            "<span>2023-08-01<br>09:30:00</span>",
            "--",
        );
        let torrents = parse_torrents(&page(HEADER, &rows), &base(), None).unwrap();
        let expected = parse_time("2023-08-01 09:30:00", None).unwrap();
        assert_eq!(torrents[0].time, expected);
        assert!(!torrents[0].is_active);
        assert!(!torrents[0].has_hnr);
        assert_eq!(torrents[0].download_multiplier, 1.0);
        assert_eq!(torrents[0].discount_end_time, -1);
    }

    #[test]
    fn test_malformed_time_cells_do_not_abort_page() {
        let rows = [
            row(
                r#"<a href="details.php?id=1">Wide</a><a href="download.php?id=1">dl</a>"#,
                "２０２３-０８-０１０９:３０:００",
                "",
            ),
            row(
                r#"<a href="details.php?id=2">Forever</a><a href="download.php?id=2">dl</a>
                   <span>剩余时间：99999999999999999999天</span>"#,
                "",
                "",
            ),
        ]
        .concat();
        let torrents = parse_torrents(&page(HEADER, &rows), &base(), None).unwrap();
        assert_eq!(torrents.len(), 2);
        assert_eq!(torrents[0].time, 0);
        assert_eq!(torrents[1].discount_end_time, -1);
    }

    #[test]
    fn test_rows_without_name_or_link_are_dropped() {
        let rows = [
            row(r#"<a href="details.php?id=1">One</a><a href="download.php?id=1">dl</a>"#, "", ""),
            row(r#"<a href="details.php?id=2">No link</a>"#, "", ""),
            row(r#"<a href="download.php?id=3">No name</a>"#, "", ""),
            r#"<tr><td colspan="8">Advertisement</td></tr>"#.to_string(),
        ]
        .concat();
        let torrents = parse_torrents(&page(HEADER, &rows), &base(), None).unwrap();
        assert_eq!(torrents.len(), 1);
        assert_eq!(torrents[0].name, "One");
    }

    #[test]
    fn test_unresolved_columns_keep_defaults() {
        let header = "<tr><td>Type</td><td>Name</td><td>A</td><td>B</td><td>C</td><td>D</td><td>E</td><td>F</td></tr>";
        let rows = row(
            r#"<a href="details.php?id=1">One</a><a href="download.php?id=1">dl</a>"#,
            "2023-08-01 09:30:00",
            "50%",
        );
        let torrents = parse_torrents(&page(header, &rows), &base(), None).unwrap();
        let t = &torrents[0];
        assert_eq!(t.size, 0);
        assert_eq!(t.seeders, 0);
        assert_eq!(t.leechers, 0);
        assert_eq!(t.snatched, 0);
        assert_eq!(t.time, 0);
        assert!(!t.is_active);
    }

    #[test]
    fn test_column_index_from_header() {
        let document = Html::parse_document(&page(HEADER, ""));
        let selector = parse_selector(ROWS_SELECTOR).unwrap();
        let header = document.select(&selector).next().unwrap();
        let index = ColumnFieldIndex::from_header(header);

        assert_eq!(index.get(Field::Time), Some(2));
        assert_eq!(index.get(Field::Size), Some(3));
        assert_eq!(index.get(Field::Seeders), Some(4));
        assert_eq!(index.get(Field::Leechers), Some(5));
        assert_eq!(index.get(Field::Snatched), Some(6));
        assert_eq!(index.progress, Some(7));
        assert_eq!(index.field_at(3), Some(Field::Size));
        assert_eq!(index.field_at(0), None);
    }

    #[test]
    fn test_duplicate_markers_keep_first_column() {
        let header = r#"<tr><td><img alt="size"></td><td><img alt="size"></td></tr>"#;
        let document = Html::parse_document(&page(header, ""));
        let selector = parse_selector(ROWS_SELECTOR).unwrap();
        let index = ColumnFieldIndex::from_header(document.select(&selector).next().unwrap());
        assert_eq!(index.get(Field::Size), Some(0));
    }

    #[test]
    fn test_missing_table_is_parse_error() {
        let result = parse_torrents("<html><body><p>Please log in</p></body></html>", &base(), None);
        assert!(matches!(result, Err(PtoolError::Parse(_))));
    }

    #[test]
    fn test_email_artifact_is_removed() {
        let rows = row(
            r#"<a href="details.php?id=5">Album-DIY<span class="__cf_email__">[email&#160;protected]</span></a>
               <a href="download.php?id=5">dl</a>"#,
            "",
            "",
        );
        let torrents = parse_torrents(&page(HEADER, &rows), &base(), None).unwrap();
        assert_eq!(torrents[0].name, "Album-DIY");
    }

    #[test]
    fn test_free_wins_over_partial_promotion() {
        let rows = row(
            r#"<a href="details.php?id=6">Promo</a><a href="download.php?id=6">dl</a>
               <img class="pro_50pctdown" alt="50%"><img class="pro_free2up" alt="2X Free">"#,
            "",
            "",
        );
        let torrents = parse_torrents(&page(HEADER, &rows), &base(), None).unwrap();
        assert_eq!(torrents[0].download_multiplier, 0.0);
        assert_eq!(torrents[0].upload_multiplier, 2.0);
    }

    #[test]
    fn test_seeding_title_marks_active() {
        let rows = row(
            r#"<a href="details.php?id=7">Active</a><a href="download.php?id=7">dl</a>
               <div title="seeding 100%"></div>"#,
            "",
            "",
        );
        let torrents = parse_torrents(&page(HEADER, &rows), &base(), None).unwrap();
        assert!(torrents[0].is_active);
    }

    #[test]
    fn test_parsing_is_repeatable() {
        let rows = [
            row(r#"<a href="details.php?id=1">One</a><a href="download.php?id=1">dl</a>"#, "2023-08-01 09:30:00", "10%"),
            row(r#"<a href="details.php?id=2">Two</a><a href="download.php?id=2">dl</a>"#, "2023-08-02 09:30:00", ""),
        ]
        .concat();
        let html = page(HEADER, &rows);
        let first = parse_torrents(&html, &base(), None).unwrap();
        let second = parse_torrents(&html, &base(), None).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_get_latest_torrents_uses_cookie_and_default_url() {
        let rows = row(r#"<a href="details.php?id=1">One</a><a href="download.php?id=1">dl</a>"#, "", "");
        let fetcher = Arc::new(
            StaticFetcher::default().with_page("https://pt.example.org/torrents.php", page(HEADER, &rows)),
        );
        let config = SiteConfig {
            name: "demo".into(),
            site_type: SITE_TYPE.into(),
            url: "https://pt.example.org".into(),
            cookie: "uid=1; pass=abc".into(),
            ..Default::default()
        };
        let site = NexusPhpSite::new(config, fetcher.clone()).unwrap();

        let torrents = tokio_test::block_on(site.get_latest_torrents(None)).unwrap();
        assert_eq!(torrents.len(), 1);

        let requests = fetcher.requests.lock().unwrap();
        assert_eq!(requests[0].0, "https://pt.example.org/torrents.php");
        assert_eq!(requests[0].1.as_deref(), Some("uid=1; pass=abc"));
    }

    #[test]
    fn test_fetch_failure_propagates() {
        let site = NexusPhpSite::new(
            SiteConfig {
                name: "demo".into(),
                url: BASE.into(),
                ..Default::default()
            },
            Arc::new(StaticFetcher::default()),
        )
        .unwrap();

        let result = tokio_test::block_on(site.get_latest_torrents(Some("https://pt.example.org/x.php")));
        assert!(matches!(result, Err(ref e) if e.is_transport()));
    }

    #[test]
    fn test_download_torrent_resolves_relative_url() {
        let fetcher = Arc::new(
            StaticFetcher::default().with_page("https://pt.example.org/download.php?id=9", b"d8:announce".to_vec()),
        );
        let site = NexusPhpSite::new(
            SiteConfig {
                name: "demo".into(),
                url: BASE.into(),
                ..Default::default()
            },
            fetcher.clone(),
        )
        .unwrap();

        let bytes = tokio_test::block_on(site.download_torrent("download.php?id=9")).unwrap();
        assert_eq!(bytes, b"d8:announce");
        assert_eq!(fetcher.requests.lock().unwrap()[0].1, None);
    }
}
