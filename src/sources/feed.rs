use crate::types::{domain_of, NewsError, NewsItem, Result};
use chrono::Utc;
use feed_rs::parser;
use reqwest::Client;
use tracing::{debug, warn};

/// At most this many entries are taken from a feed, in document order.
pub const FEED_ENTRY_LIMIT: usize = 15;

/// Fetcher for generic RSS/Atom sources.
pub struct FeedFetcher {
    client: Client,
}

impl FeedFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Fetch and normalize one feed. Besides the items this returns the
    /// accepted entry titles joined into one string, which the classifier
    /// scores against its keyword table.
    ///
    /// Network and parse failures degrade to `(vec![], "")`.
    pub async fn fetch(&self, url: &str, display_name: &str) -> (Vec<NewsItem>, String) {
        match self.fetch_inner(url, display_name).await {
            Ok(result) => result,
            Err(e) => {
                warn!("feed fetch failed for {url}: {e}");
                (Vec::new(), String::new())
            }
        }
    }

    async fn fetch_inner(&self, url: &str, display_name: &str) -> Result<(Vec<NewsItem>, String)> {
        let body = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        let feed = parser::parse(body.as_ref()).map_err(|e| NewsError::Feed(e.to_string()))?;
        let feed_title = feed.title.map(|t| t.content);

        let mut items = Vec::new();
        let mut corpus = String::new();
        for entry in feed.entries.into_iter().take(FEED_ENTRY_LIMIT) {
            let Some(link) = entry
                .links
                .first()
                .map(|l| l.href.clone())
                .filter(|href| !href.is_empty())
            else {
                debug!("skipping entry without link in {url}");
                continue;
            };
            let Some(title) = entry
                .title
                .map(|t| t.content)
                .filter(|title| !title.is_empty())
            else {
                debug!("skipping entry without title in {url}");
                continue;
            };

            let author = entry
                .authors
                .first()
                .map(|a| a.name.clone())
                .filter(|name| !name.is_empty())
                .or_else(|| feed_title.clone())
                .unwrap_or_else(|| display_name.to_string());
            let timestamp = entry
                .published
                .map(|d| d.timestamp())
                .unwrap_or_else(|| Utc::now().timestamp());
            let external_id = if entry.id.is_empty() {
                link.clone()
            } else {
                entry.id
            };

            if !corpus.is_empty() {
                corpus.push(' ');
            }
            corpus.push_str(&title);

            items.push(NewsItem {
                title,
                domain: domain_of(&link),
                comments_url: link.clone(),
                url: link,
                score: 0,
                author,
                timestamp,
                external_id,
                source_name: display_name.to_string(),
            });
        }

        Ok((items, corpus))
    }
}
