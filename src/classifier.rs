use crate::registry::FeedRegistry;
use crate::sources::FeedFetcher;
use tracing::{debug, info, warn};

/// A source is promoted only when its best category scores strictly more
/// distinct keyword hits than this.
pub const PROMOTION_THRESHOLD: usize = 2;

/// Ordered category → keyword table. Order matters: ties between equal
/// maxima resolve to the first-defined category, so this stays a slice,
/// not a map.
pub const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    ("tech", &["software", "programming", "startup", "chip", "hardware", "linux", "open source", "developer"]),
    ("ai", &["ai", "artificial intelligence", "machine learning", "llm", "neural", "model", "training"]),
    ("design", &["design", "designer", "ux", "typography", "font", "figma", "interface"]),
    ("world", &["election", "government", "war", "minister", "president", "diplomat", "sanctions"]),
    ("science", &["study", "researchers", "physics", "climate", "species", "vaccine", "telescope"]),
    ("business", &["market", "economy", "inflation", "stocks", "earnings", "investors", "revenue"]),
    ("gaming", &["game", "nintendo", "playstation", "xbox", "steam", "esports", "console"]),
];

/// Score a title corpus against the keyword table.
///
/// Counts *distinct* keywords per category appearing anywhere in the
/// lowercased corpus (plain substring match, deliberately crude). Returns
/// the winning category and its hit count; `None` only for an empty table.
pub fn score_corpus(corpus: &str) -> Option<(&'static str, usize)> {
    let lowered = corpus.to_lowercase();
    let mut best: Option<(&'static str, usize)> = None;
    for &(category, keywords) in CATEGORY_KEYWORDS {
        let hits = keywords.iter().filter(|kw| lowered.contains(**kw)).count();
        // strict comparison keeps the first-defined category on ties
        if best.map_or(true, |(_, best_hits)| hits > best_hits) {
            best = Some((category, hits));
        }
    }
    best
}

/// Assigns concrete categories to provisionally-registered sources by
/// keyword-scoring a sample of their content.
pub struct Classifier {
    fetcher: FeedFetcher,
    registry: FeedRegistry,
}

impl Classifier {
    pub fn new(fetcher: FeedFetcher, registry: FeedRegistry) -> Self {
        Self { fetcher, registry }
    }

    /// One classification pass over every unclassified registry entry.
    /// Unreachable feeds and low-confidence scores are left pending for a
    /// future cycle.
    pub async fn run(&self) {
        let pending = match self.registry.unclassified().await {
            Ok(pending) => pending,
            Err(e) => {
                warn!("could not list unclassified feeds: {e}");
                return;
            }
        };
        if pending.is_empty() {
            return;
        }
        debug!("classifying {} pending feeds", pending.len());

        for feed in pending {
            let (_, corpus) = self.fetcher.fetch(&feed.url, &feed.name).await;
            if corpus.is_empty() {
                debug!("no corpus from {} yet, classification pending", feed.url);
                continue;
            }
            let Some((category, hits)) = score_corpus(&corpus) else {
                continue;
            };
            if hits > PROMOTION_THRESHOLD {
                match self.registry.set_category(feed.id, category).await {
                    Ok(()) => info!("classified {} as {category} ({hits} keyword hits)", feed.url),
                    Err(e) => warn!("could not promote {}: {e}", feed.url),
                }
            } else {
                debug!("{} stays unclassified (best {category} with {hits} hits)", feed.url);
            }
        }
    }
}
