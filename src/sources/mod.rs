pub mod feed;
pub mod top_stories;

pub use feed::FeedFetcher;
pub use top_stories::TopStoriesFetcher;

use crate::types::Result;
use reqwest::Client;
use std::time::Duration;

/// Default timeout for outbound requests. A stuck host must not stall a
/// cycle beyond this.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared HTTP client for all fetchers. The user agent matters: many
/// feed hosts reject default client signatures.
pub fn http_client(user_agent: &str) -> Result<Client> {
    let client = Client::builder()
        .user_agent(user_agent)
        .timeout(REQUEST_TIMEOUT)
        .gzip(true)
        .deflate(true)
        .brotli(true)
        .build()?;
    Ok(client)
}
