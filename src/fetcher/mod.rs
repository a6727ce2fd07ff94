pub mod http_fetcher;

use async_trait::async_trait;

use crate::app::Result;

pub use http_fetcher::HttpFetcher;

#[async_trait]
pub trait Fetcher {
    /// GET `url` with browser-like headers and an optional `Cookie` header.
    ///
    /// Any status other than 200 is an error.
    async fn fetch(&self, url: &str, cookie: Option<&str>) -> Result<Vec<u8>>;
}
