use crate::types::{Feed, Result, SourceKind};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{info, warn};

/// Placeholder category for freshly discovered, not-yet-classified sources.
pub const PROVISIONAL_CATEGORY: &str = "other";

/// Sources the registry is seeded with when the `feeds` table is empty
/// at first startup.
const DEFAULT_FEEDS: &[(&str, &str, &str, SourceKind)] = &[
    ("Hacker News", "https://hacker-news.firebaseio.com/v0", "tech", SourceKind::Hn),
    ("The Verge", "https://www.theverge.com/rss/index.xml", "tech", SourceKind::Rss),
    ("Wired", "https://www.wired.com/feed/rss", "tech", SourceKind::Rss),
    ("TechCrunch", "https://techcrunch.com/feed/", "tech", SourceKind::Rss),
    ("Ars Technica", "https://feeds.arstechnica.com/arstechnica/index", "tech", SourceKind::Rss),
    ("Engadget", "https://www.engadget.com/rss.xml", "tech", SourceKind::Rss),
    ("r/ArtificialIntelligence", "https://www.reddit.com/r/ArtificialIntelligence/.rss", "ai", SourceKind::Rss),
    ("r/Design", "https://www.reddit.com/r/Design/.rss", "design", SourceKind::Rss),
    ("r/worldnews", "https://www.reddit.com/r/worldnews/.rss", "world", SourceKind::Rss),
    ("r/science", "https://www.reddit.com/r/science/.rss", "science", SourceKind::Rss),
    ("r/economics", "https://www.reddit.com/r/economics/.rss", "business", SourceKind::Rss),
    ("r/Games", "https://www.reddit.com/r/Games/.rss", "gaming", SourceKind::Rss),
];

/// Durable list of feed descriptors, backed by one SQLite table.
///
/// Grown by the discovery engine, mutated (category only) by the
/// classifier, read by the scheduler each cycle. Rows are never deleted;
/// `enabled` is the soft-removal path.
#[derive(Clone)]
pub struct FeedRegistry {
    db: SqlitePool,
}

impl FeedRegistry {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let db = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;
        Ok(Self { db })
    }

    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS feeds (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                url TEXT NOT NULL UNIQUE,
                category TEXT NOT NULL,
                kind TEXT NOT NULL DEFAULT 'rss',
                enabled INTEGER NOT NULL DEFAULT 1
            )
            "#,
        )
        .execute(&self.db)
        .await?;
        Ok(())
    }

    /// Seed the curated source list, only when the table is empty.
    pub async fn seed_if_empty(&self) -> Result<()> {
        if self.count().await? > 0 {
            return Ok(());
        }
        for &(name, url, category, kind) in DEFAULT_FEEDS {
            self.insert(name, url, category, kind).await?;
        }
        info!("seeded registry with {} default sources", DEFAULT_FEEDS.len());
        Ok(())
    }

    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM feeds")
            .fetch_one(&self.db)
            .await?;
        Ok(count)
    }

    /// Insert a new descriptor. Returns false when the URL already exists;
    /// discovery must never create duplicate rows.
    pub async fn insert(&self, name: &str, url: &str, category: &str, kind: SourceKind) -> Result<bool> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO feeds (name, url, category, kind, enabled) VALUES (?, ?, ?, ?, 1)",
        )
        .bind(name)
        .bind(url)
        .bind(category)
        .bind(kind.as_str())
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn contains_url(&self, url: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM feeds WHERE url = ?")
            .bind(url)
            .fetch_one(&self.db)
            .await?;
        Ok(count > 0)
    }

    /// Distinct categories that have at least one enabled source.
    pub async fn enabled_categories(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT DISTINCT category FROM feeds WHERE enabled = 1 ORDER BY category")
            .fetch_all(&self.db)
            .await?;
        let mut categories = Vec::with_capacity(rows.len());
        for row in rows {
            categories.push(row.try_get("category")?);
        }
        Ok(categories)
    }

    pub async fn feeds_in_category(&self, category: &str) -> Result<Vec<Feed>> {
        let rows = sqlx::query("SELECT * FROM feeds WHERE enabled = 1 AND category = ? ORDER BY id")
            .bind(category)
            .fetch_all(&self.db)
            .await?;
        Ok(rows.into_iter().filter_map(feed_from_row).collect())
    }

    /// Every descriptor still carrying the provisional category, enabled
    /// or not; classification is independent of the publish path.
    pub async fn unclassified(&self) -> Result<Vec<Feed>> {
        let rows = sqlx::query("SELECT * FROM feeds WHERE category = ? ORDER BY id")
            .bind(PROVISIONAL_CATEGORY)
            .fetch_all(&self.db)
            .await?;
        Ok(rows.into_iter().filter_map(feed_from_row).collect())
    }

    pub async fn set_category(&self, id: i64, category: &str) -> Result<()> {
        sqlx::query("UPDATE feeds SET category = ? WHERE id = ?")
            .bind(category)
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    pub async fn set_enabled(&self, id: i64, enabled: bool) -> Result<()> {
        sqlx::query("UPDATE feeds SET enabled = ? WHERE id = ?")
            .bind(enabled)
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}

fn feed_from_row(row: SqliteRow) -> Option<Feed> {
    let kind_raw: String = row.try_get("kind").ok()?;
    let Some(kind) = SourceKind::parse(&kind_raw) else {
        warn!("skipping feed row with unknown kind {kind_raw:?}");
        return None;
    };
    Some(Feed {
        id: row.try_get("id").ok()?,
        name: row.try_get("name").ok()?,
        url: row.try_get("url").ok()?,
        category: row.try_get("category").ok()?,
        kind,
        enabled: row.try_get("enabled").ok()?,
    })
}
