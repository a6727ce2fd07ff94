use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, COOKIE, PRAGMA, USER_AGENT,
};
use reqwest::{Client, StatusCode};

use crate::app::{PtoolError, Result};
use crate::fetcher::Fetcher;

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/111.0.0.0 Safari/537.36";

const BROWSER_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,\
     image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7";

const REQUEST_TIMEOUT_SECS: u64 = 30;

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .gzip(true)
            .brotli(true)
            .default_headers(browser_headers())
            .build()?;

        Ok(Self { client })
    }
}

/// Headers sent with every request so tracker sites serve their normal pages.
pub fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, cookie: Option<&str>) -> Result<Vec<u8>> {
        tracing::trace!("fetch url={} has_cookie={}", url, cookie.is_some());

        let mut request = self.client.get(url);
        if let Some(cookie) = cookie.filter(|c| !c.is_empty()) {
            let value = HeaderValue::from_str(cookie)
                .map_err(|_| PtoolError::InvalidArgument("cookie contains invalid characters".into()))?;
            request = request.header(COOKIE, value);
        }

        let response = request.send().await?;
        tracing::trace!("fetch status={}", response.status());

        if response.status() != StatusCode::OK {
            return Err(PtoolError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;

    use super::*;

    #[test]
    fn test_browser_headers() {
        let headers = browser_headers();
        assert_eq!(headers.get(USER_AGENT).unwrap(), BROWSER_USER_AGENT);
        assert_eq!(headers.get(CACHE_CONTROL).unwrap(), "no-cache");
        assert_eq!(headers.get(PRAGMA).unwrap(), "no-cache");
        assert!(headers.get(COOKIE).is_none());
    }

    #[test]
    fn test_new_builds_client() {
        assert!(HttpFetcher::new().is_ok());
    }

    #[test]
    fn test_fetch_sends_cookie_and_browser_headers() {
        let server = MockServer::start();
        let page = server.mock(|when, then| {
            when.method(GET)
                .path("/torrents.php")
                .header("cookie", "uid=1; pass=x")
                .header("user-agent", BROWSER_USER_AGENT);
            then.status(200).body("<html></html>");
        });

        let fetcher = HttpFetcher::new().unwrap();
        let body = tokio_test::block_on(fetcher.fetch(&server.url("/torrents.php"), Some("uid=1; pass=x")))
            .unwrap();

        assert_eq!(body, b"<html></html>");
        page.assert();
    }

    #[test]
    fn test_fetch_non_200_is_status_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/missing");
            then.status(404).body("not here");
        });

        let fetcher = HttpFetcher::new().unwrap();
        let url = server.url("/missing");
        let result = tokio_test::block_on(fetcher.fetch(&url, None));

        match result {
            Err(PtoolError::Status { url: failed, status }) => {
                assert_eq!(failed, url);
                assert_eq!(status, 404);
            }
            other => panic!("expected status error, got {:?}", other.map(|b| b.len())),
        }
    }
}
