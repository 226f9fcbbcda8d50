pub mod http_fetcher;

use async_trait::async_trait;

use crate::app::Result;

pub use http_fetcher::{HttpFetcher, DEFAULT_TIMEOUT, USER_AGENT};

#[async_trait]
pub trait Fetcher {
    /// Downloads the raw feed document at `url`.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}
