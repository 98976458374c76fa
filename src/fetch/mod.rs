//! Outbound HTTP fetcher for the cache-fill commands
//!
//! Retrieval runs outside the engine lock so a slow origin never stalls other
//! sessions; the result is handed back to the dispatcher which installs it in
//! the cache under the lock.

use std::time::Duration;

/// Default cache lifetime for FETCHCACHE when the argument does not parse
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 86_400;

/// A fetch the dispatcher deferred to the connection task
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub url: String,

    /// None caches without expiry (FETCH), Some(n) caches for n seconds
    /// (FETCHCACHE)
    pub ttl_seconds: Option<u64>,
}

/// HTTP client wrapper with a bounded timeout
pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    /// Build a fetcher whose requests abort after `timeout`
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Fetcher { client })
    }

    /// Retrieve the body of `url` as text
    pub async fn fetch(&self, url: &str) -> Result<String, reqwest::Error> {
        self.client.get(url).send().await?.text().await
    }
}
