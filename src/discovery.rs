use crate::registry::{FeedRegistry, PROVISIONAL_CATEGORY};
use crate::types::{NewsItem, Result, SourceKind};
use rand::seq::IndexedRandom;
use regex::Regex;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Articles sampled from the signal batch per cycle. Bounded on purpose:
/// discovery should not hammer unknown third-party hosts.
pub const DISCOVERY_SAMPLE: usize = 2;

/// Hosts that never carry a usable autodiscovery link (video and code
/// hosting); skipped before any request is made.
pub const DOMAIN_DENYLIST: &[&str] = &[
    "youtube.com",
    "youtu.be",
    "vimeo.com",
    "twitch.tv",
    "github.com",
    "gitlab.com",
    "bitbucket.org",
];

const PAGE_TIMEOUT: Duration = Duration::from_secs(4);

/// Grows the source registry by scanning sampled article pages for RSS/Atom
/// autodiscovery links. Best-effort: every failure is logged and skipped.
pub struct Discovery {
    client: Client,
    registry: FeedRegistry,
}

impl Discovery {
    pub fn new(client: Client, registry: FeedRegistry) -> Self {
        Self { client, registry }
    }

    pub async fn run(&self, batch: &[NewsItem]) {
        // rng is scoped out before the first await; ThreadRng is not Send
        let sample: Vec<NewsItem> = {
            let mut rng = rand::rng();
            batch
                .choose_multiple(&mut rng, DISCOVERY_SAMPLE)
                .cloned()
                .collect()
        };
        for item in &sample {
            if item.domain == "Self" || DOMAIN_DENYLIST.contains(&item.domain.as_str()) {
                debug!("discovery skipping {}", item.domain);
                continue;
            }
            if let Err(e) = self.probe(item).await {
                debug!("discovery skipped {}: {e}", item.url);
            }
        }
    }

    /// Fetch the article page and register its advertised feed, if any.
    async fn probe(&self, item: &NewsItem) -> Result<()> {
        let response = self.client.get(&item.url).timeout(PAGE_TIMEOUT).send().await?;
        if !response.status().is_success() {
            debug!("discovery got {} from {}", response.status(), item.url);
            return Ok(());
        }
        let html = response.text().await?;

        let Some(feed_url) = find_feed_link(&html, &item.url) else {
            return Ok(());
        };
        if self.registry.contains_url(&feed_url).await? {
            debug!("feed {feed_url} already registered");
            return Ok(());
        }
        if self
            .registry
            .insert(&item.domain, &feed_url, PROVISIONAL_CATEGORY, SourceKind::Rss)
            .await?
        {
            info!("discovered feed {feed_url} on {}", item.domain);
        }
        Ok(())
    }
}

/// Find the first RSS/Atom autodiscovery `<link>` in the document head and
/// resolve its href against the page URL. Only the head is consulted.
pub fn find_feed_link(html: &str, page_url: &str) -> Option<String> {
    // ASCII lowercasing preserves byte offsets, so the index is valid in
    // the original document.
    let head_end = html.to_ascii_lowercase().find("</head>");
    let head = match head_end {
        Some(end) => &html[..end],
        None => html,
    };

    let link_re =
        Regex::new(r#"(?is)<link\b[^>]*type\s*=\s*["']application/(?:rss|atom)\+xml["'][^>]*>"#)
            .ok()?;
    let href_re = Regex::new(r#"(?i)href\s*=\s*["']([^"']+)["']"#).ok()?;
    let base = Url::parse(page_url).ok()?;

    for tag in link_re.find_iter(head) {
        if let Some(captures) = href_re.captures(tag.as_str()) {
            if let Ok(resolved) = base.join(&captures[1]) {
                return Some(resolved.to_string());
            }
        }
    }
    None
}
