use crate::types::{domain_of, NewsItem, Result};
use chrono::Utc;
use futures::{stream, StreamExt};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// How many ids from the top-stories listing are looked up per cycle.
pub const TOP_STORIES_LIMIT: usize = 30;

/// Bounded fan-out for per-item lookups.
const ITEM_FETCH_CONCURRENCY: usize = 8;

/// Per-item lookups are short; a slow item record is skipped, not waited on.
const ITEM_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Deserialize)]
struct RawStory {
    title: Option<String>,
    url: Option<String>,
    score: Option<i64>,
    by: Option<String>,
    time: Option<i64>,
}

/// Fetcher for the Hacker News top-stories API: one listing request for
/// the ordered id list, then bounded-concurrency item lookups.
pub struct TopStoriesFetcher {
    client: Client,
    base_url: String,
}

impl TopStoriesFetcher {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Returns a possibly-empty list; fetch and parse errors never escape
    /// this boundary.
    pub async fn fetch(&self, source_name: &str) -> Vec<NewsItem> {
        match self.fetch_inner(source_name).await {
            Ok(items) => items,
            Err(e) => {
                warn!("top-stories fetch failed: {e}");
                Vec::new()
            }
        }
    }

    async fn fetch_inner(&self, source_name: &str) -> Result<Vec<NewsItem>> {
        let ids: Vec<i64> = self
            .client
            .get(format!("{}/topstories.json", self.base_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        // Output order is irrelevant here; the scheduler sorts the merged
        // category batch by timestamp.
        let items: Vec<NewsItem> = stream::iter(ids.into_iter().take(TOP_STORIES_LIMIT))
            .map(|id| self.fetch_story(id, source_name))
            .buffer_unordered(ITEM_FETCH_CONCURRENCY)
            .filter_map(|story| async move { story })
            .collect()
            .await;

        Ok(items)
    }

    /// Look up one item record. Failed lookups and records without a
    /// destination URL are excluded, not faked.
    async fn fetch_story(&self, id: i64, source_name: &str) -> Option<NewsItem> {
        let response = self
            .client
            .get(format!("{}/item/{}.json", self.base_url, id))
            .timeout(ITEM_TIMEOUT)
            .send()
            .await
            .ok()?;
        if !response.status().is_success() {
            debug!("item {id} lookup returned {}", response.status());
            return None;
        }

        // The API answers `null` for missing items.
        let raw: RawStory = response.json::<Option<RawStory>>().await.ok()??;

        let title = raw.title.filter(|t| !t.is_empty())?;
        let url = raw.url.filter(|u| !u.is_empty())?;

        Some(NewsItem {
            title,
            domain: domain_of(&url),
            url,
            score: raw.score.unwrap_or(0),
            author: raw.by.unwrap_or_else(|| "unknown".to_string()),
            timestamp: raw.time.unwrap_or_else(|| Utc::now().timestamp()),
            comments_url: format!("https://news.ycombinator.com/item?id={id}"),
            external_id: id.to_string(),
            source_name: source_name.to_string(),
        })
    }
}
