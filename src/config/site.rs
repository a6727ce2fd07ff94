//! Per-site configuration.

use std::str::FromStr;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Listing page used when a site does not configure `torrents_url`.
const DEFAULT_TORRENTS_PATH: &str = "torrents.php";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub name: String,
    /// Site family, the key used to look up a constructor in the site registry.
    #[serde(rename = "type")]
    pub site_type: String,
    pub url: String,
    pub cookie: String,
    /// Fixed UTC offset such as `+08:00` used for absolute page timestamps.
    pub timezone: Option<String>,
    pub torrents_url: Option<String>,
    pub disabled: bool,
}

impl SiteConfig {
    /// Fill every unset field from `defaults`. Set fields always win.
    pub fn merged_over(&self, defaults: &SiteConfig) -> SiteConfig {
        SiteConfig {
            name: pick(&self.name, &defaults.name),
            site_type: pick(&self.site_type, &defaults.site_type),
            url: pick(&self.url, &defaults.url),
            cookie: pick(&self.cookie, &defaults.cookie),
            timezone: self.timezone.clone().or_else(|| defaults.timezone.clone()),
            torrents_url: self
                .torrents_url
                .clone()
                .or_else(|| defaults.torrents_url.clone()),
            disabled: self.disabled || defaults.disabled,
        }
    }

    /// Site URL with a trailing slash so relative links join under it.
    pub fn base_url(&self) -> String {
        if self.url.ends_with('/') {
            self.url.clone()
        } else {
            format!("{}/", self.url)
        }
    }

    pub fn torrents_url(&self) -> String {
        match &self.torrents_url {
            Some(url) if !url.is_empty() => url.clone(),
            _ => format!("{}{}", self.base_url(), DEFAULT_TORRENTS_PATH),
        }
    }

    pub fn offset(&self) -> Result<Option<FixedOffset>, ConfigError> {
        match self.timezone.as_deref() {
            None | Some("") => Ok(None),
            Some(tz) => FixedOffset::from_str(tz)
                .map(Some)
                .map_err(|_| ConfigError::InvalidValue {
                    field: format!("sites.{}.timezone", self.name),
                    value: tz.to_string(),
                }),
        }
    }
}

pub(crate) fn pick(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> SiteConfig {
        SiteConfig {
            name: "demo".into(),
            site_type: "nexusphp".into(),
            url: "https://demo.example.org".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_merge_keeps_set_fields() {
        let defaults = SiteConfig {
            site_type: "other".into(),
            cookie: "uid=1".into(),
            timezone: Some("+08:00".into()),
            ..Default::default()
        };
        let merged = site().merged_over(&defaults);
        assert_eq!(merged.site_type, "nexusphp");
        assert_eq!(merged.cookie, "uid=1");
        assert_eq!(merged.timezone.as_deref(), Some("+08:00"));
        assert!(!merged.disabled);
    }

    #[test]
    fn test_base_and_torrents_url() {
        let mut config = site();
        assert_eq!(config.base_url(), "https://demo.example.org/");
        assert_eq!(config.torrents_url(), "https://demo.example.org/torrents.php");

        config.torrents_url = Some("https://demo.example.org/special.php".into());
        assert_eq!(config.torrents_url(), "https://demo.example.org/special.php");
    }

    #[test]
    fn test_offset() {
        let mut config = site();
        assert_eq!(config.offset().unwrap(), None);

        config.timezone = Some("+08:00".into());
        assert_eq!(config.offset().unwrap(), FixedOffset::east_opt(8 * 3600));

        config.timezone = Some("Asia/Shanghai".into());
        assert!(config.offset().is_err());
    }
}
