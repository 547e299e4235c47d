use crate::cache::{news_key, NewsCache};
use crate::classifier::Classifier;
use crate::discovery::Discovery;
use crate::registry::FeedRegistry;
use crate::sources::{FeedFetcher, TopStoriesFetcher};
use crate::types::{NewsItem, SourceKind};
use reqwest::Client;
use std::time::Duration;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{error, info, warn};

/// Published batches are capped at this many items.
pub const MAX_BATCH_ITEMS: usize = 150;

/// The category whose batch feeds the discovery engine.
pub const SIGNAL_CATEGORY: &str = "tech";

/// Drives the aggregation pipeline: per category, fetch every enabled
/// source, merge, sort, cap and publish; then run discovery and
/// classification before going idle again.
pub struct Aggregator {
    registry: FeedRegistry,
    cache: NewsCache,
    top_stories: TopStoriesFetcher,
    feeds: FeedFetcher,
    discovery: Discovery,
    classifier: Classifier,
    cache_ttl: Duration,
}

impl Aggregator {
    pub fn new(
        registry: FeedRegistry,
        cache: NewsCache,
        client: Client,
        hn_api_base: &str,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            top_stories: TopStoriesFetcher::new(client.clone(), hn_api_base),
            feeds: FeedFetcher::new(client.clone()),
            discovery: Discovery::new(client.clone(), registry.clone()),
            classifier: Classifier::new(FeedFetcher::new(client), registry.clone()),
            registry,
            cache,
            cache_ttl,
        }
    }

    /// Periodic driver. The first cycle runs right away; afterwards cycles
    /// fire on a fixed interval. A tick that lands while a cycle is still
    /// in flight is delayed, never interleaved, so the same cache key is
    /// never written twice concurrently.
    pub async fn run(self, cycle_interval: Duration) {
        let mut ticker = interval(cycle_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.run_cycle().await;
        }
    }

    /// One full aggregation cycle. Individual source and category failures
    /// are absorbed; nothing here ends the scheduling loop.
    pub async fn run_cycle(&self) {
        let started = Instant::now();
        let categories = match self.registry.enabled_categories().await {
            Ok(categories) => categories,
            Err(e) => {
                error!("cycle aborted, registry unavailable: {e}");
                return;
            }
        };

        let mut signal_batch = Vec::new();
        for category in &categories {
            let batch = self.build_batch(category).await;
            if category == SIGNAL_CATEGORY {
                signal_batch = batch.clone();
            }
            self.publish(category, &batch).await;
        }

        self.discovery.run(&signal_batch).await;
        self.classifier.run().await;

        info!(
            "cycle finished in {:?} across {} categories",
            started.elapsed(),
            categories.len()
        );
    }

    /// Fetch every enabled source of one category and merge the results.
    /// A failing source contributes nothing; partial batches are expected.
    async fn build_batch(&self, category: &str) -> Vec<NewsItem> {
        let feeds = match self.registry.feeds_in_category(category).await {
            Ok(feeds) => feeds,
            Err(e) => {
                warn!("skipping category {category}, registry read failed: {e}");
                return Vec::new();
            }
        };

        let mut items = Vec::new();
        for feed in feeds {
            let fetched = match feed.kind {
                SourceKind::Hn => self.top_stories.fetch(&feed.name).await,
                SourceKind::Rss => self.feeds.fetch(&feed.url, &feed.name).await.0,
            };
            items.extend(fetched);
        }
        finalize_batch(items)
    }

    async fn publish(&self, category: &str, batch: &[NewsItem]) {
        let payload = match serde_json::to_string(batch) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("could not encode batch for {category}: {e}");
                return;
            }
        };
        self.cache.setex(&news_key(category), payload, self.cache_ttl).await;
        info!("published {} items for {category}", batch.len());
    }
}

/// Sort newest-first and cap. Published batches never carry items with an
/// empty title or url.
fn finalize_batch(mut items: Vec<NewsItem>) -> Vec<NewsItem> {
    items.retain(|item| !item.title.is_empty() && !item.url.is_empty());
    items.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    items.truncate(MAX_BATCH_ITEMS);
    items
}
