use serde::{Deserialize, Serialize};
use url::Url;

/// One normalized news record, produced fresh by a fetcher each cycle.
///
/// Every item carries a non-empty `title` and `url`; fetchers drop source
/// records that cannot satisfy that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub url: String,
    /// Source-provided ranking signal, 0 when the source has none.
    pub score: i64,
    pub author: String,
    /// Unix seconds; fetch-time wall clock when the source gives no date.
    pub timestamp: i64,
    pub domain: String,
    /// Discussion link. Equals `url` for feed items, the Hacker News
    /// comment page for top-story items.
    pub comments_url: String,
    /// Stable id from the source, falling back to `url`.
    pub external_id: String,
    pub source_name: String,
}

/// How a registry entry is fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// The Hacker News top-stories API.
    Hn,
    /// A generic RSS/Atom feed.
    Rss,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Hn => "hn",
            SourceKind::Rss => "rss",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "hn" => Some(SourceKind::Hn),
            "rss" => Some(SourceKind::Rss),
            _ => None,
        }
    }
}

/// One durable source descriptor from the `feeds` table.
#[derive(Debug, Clone)]
pub struct Feed {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub category: String,
    pub kind: SourceKind,
    pub enabled: bool,
}

/// Host of `url` with a leading `www.` stripped, or the `"Self"` sentinel
/// when the URL has no parseable host.
pub fn domain_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
        .unwrap_or_else(|| "Self".to_string())
}

#[derive(Debug, thiserror::Error)]
pub enum NewsError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("feed parse error: {0}")]
    Feed(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, NewsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_strips_www_prefix() {
        assert_eq!(domain_of("https://www.example.com/a"), "example.com");
    }

    #[test]
    fn domain_keeps_bare_host() {
        assert_eq!(domain_of("https://news.ycombinator.com/item?id=1"), "news.ycombinator.com");
    }

    #[test]
    fn domain_falls_back_to_self() {
        assert_eq!(domain_of("not a url"), "Self");
        assert_eq!(domain_of(""), "Self");
        // parses, but has no host
        assert_eq!(domain_of("mailto:someone@example.com"), "Self");
    }

    #[test]
    fn source_kind_round_trips() {
        assert_eq!(SourceKind::parse("hn"), Some(SourceKind::Hn));
        assert_eq!(SourceKind::parse("rss"), Some(SourceKind::Rss));
        assert_eq!(SourceKind::parse("atom"), None);
        assert_eq!(SourceKind::Rss.as_str(), "rss");
    }
}
