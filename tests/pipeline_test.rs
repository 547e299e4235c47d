use axum::routing::get;
use axum::Router;
use prism::api::{self, ApiState};
use prism::{
    http_client, news_key, Aggregator, Classifier, Discovery, FeedFetcher, FeedRegistry, NewsCache,
    NewsItem, SourceKind, TopStoriesFetcher, PROVISIONAL_CATEGORY,
};
use sqlx::sqlite::SqlitePoolOptions;
use std::time::Duration;

fn rss_doc(items: &[(&str, &str, &str)]) -> String {
    let mut body = String::from(
        "<?xml version=\"1.0\"?><rss version=\"2.0\"><channel><title>Fixture Feed</title><link>https://fixture.invalid/</link>",
    );
    for (title, link, pub_date) in items {
        body.push_str(&format!(
            "<item><title>{title}</title><link>{link}</link><pubDate>{pub_date}</pubDate></item>"
        ));
    }
    body.push_str("</channel></rss>");
    body
}

fn fixture_router() -> Router {
    Router::new()
        .route(
            "/feed.xml",
            get(|| async {
                rss_doc(&[
                    ("first", "https://articles.invalid/one", "Wed, 01 May 2024 10:00:00 GMT"),
                    ("second", "https://articles.invalid/two", "Wed, 01 May 2024 11:00:00 GMT"),
                    ("third", "https://articles.invalid/three", "Wed, 01 May 2024 12:00:00 GMT"),
                ])
            }),
        )
        .route("/empty.xml", get(|| async { rss_doc(&[]) }))
        .route(
            "/ai.xml",
            get(|| async {
                rss_doc(&[
                    ("AI benchmark results", "https://articles.invalid/a", "Wed, 01 May 2024 10:00:00 GMT"),
                    ("Model training at scale", "https://articles.invalid/b", "Wed, 01 May 2024 11:00:00 GMT"),
                    ("Neural networks explained", "https://articles.invalid/c", "Wed, 01 May 2024 12:00:00 GMT"),
                ])
            }),
        )
        .route(
            "/neutral.xml",
            get(|| async {
                rss_doc(&[
                    ("Sunday brunch photos", "https://articles.invalid/d", "Wed, 01 May 2024 10:00:00 GMT"),
                    ("My trip to the lake", "https://articles.invalid/e", "Wed, 01 May 2024 11:00:00 GMT"),
                ])
            }),
        )
        .route(
            "/article",
            get(|| async {
                "<html><head><title>Post</title>\
                 <link rel=\"alternate\" type=\"application/rss+xml\" href=\"/found.xml\">\
                 </head><body>hello</body></html>"
                    .to_string()
            }),
        )
        .route("/v0/topstories.json", get(|| async { "[1, 2, 3]" }))
        .route(
            "/v0/item/1.json",
            get(|| async {
                r#"{"id":1,"title":"Show HN: prism","url":"https://www.example.com/prism","score":120,"by":"alice","time":1714557600,"type":"story"}"#
            }),
        )
        .route(
            "/v0/item/2.json",
            get(|| async { r#"{"id":2,"title":"Ask HN: no url here","score":5,"by":"bob","time":1714557601,"type":"story"}"# }),
        )
        .route("/v0/item/3.json", get(|| async { "null" }))
}

async fn spawn_fixture() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, fixture_router()).await.unwrap();
    });
    format!("http://{addr}")
}

async fn memory_registry() -> FeedRegistry {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let registry = FeedRegistry::new(pool);
    registry.ensure_schema().await.unwrap();
    registry
}

fn sample_item(url: &str, domain: &str) -> NewsItem {
    NewsItem {
        title: "sample".to_string(),
        url: url.to_string(),
        score: 0,
        author: "unknown".to_string(),
        timestamp: 0,
        domain: domain.to_string(),
        comments_url: url.to_string(),
        external_id: url.to_string(),
        source_name: "Fixture".to_string(),
    }
}

#[tokio::test]
async fn cycle_publishes_sorted_capped_batch() {
    let base = spawn_fixture().await;
    let registry = memory_registry().await;
    registry
        .insert("Local Feed", &format!("{base}/feed.xml"), "tech", SourceKind::Rss)
        .await
        .unwrap();

    let cache = NewsCache::new();
    let client = http_client("prism-test/1.0").unwrap();
    let aggregator = Aggregator::new(
        registry,
        cache.clone(),
        client,
        &format!("{base}/v0"),
        Duration::from_secs(60),
    );

    aggregator.run_cycle().await;

    let payload = cache.get(&news_key("tech")).await.expect("batch published");
    let batch: Vec<NewsItem> = serde_json::from_str(&payload).unwrap();
    assert_eq!(batch.len(), 3);
    let titles: Vec<&str> = batch.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, ["third", "second", "first"]);
    assert!(batch.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    for item in &batch {
        assert!(!item.title.is_empty());
        assert!(!item.url.is_empty());
        assert_eq!(item.domain, "articles.invalid");
        assert_eq!(item.comments_url, item.url);
        assert_eq!(item.source_name, "Local Feed");
    }
}

#[tokio::test]
async fn feed_fetch_failures_degrade_to_empty() {
    let base = spawn_fixture().await;
    let fetcher = FeedFetcher::new(http_client("prism-test/1.0").unwrap());

    // zero entries parses fine but yields nothing
    let (items, corpus) = fetcher.fetch(&format!("{base}/empty.xml"), "Empty").await;
    assert!(items.is_empty());
    assert_eq!(corpus, "");

    // 404
    let (items, corpus) = fetcher.fetch(&format!("{base}/missing.xml"), "Missing").await;
    assert!(items.is_empty());
    assert_eq!(corpus, "");

    // not a feed document at all
    let (items, corpus) = fetcher.fetch(&format!("{base}/article"), "Html").await;
    assert!(items.is_empty());
    assert_eq!(corpus, "");
}

#[tokio::test]
async fn top_stories_skips_unusable_records() {
    let base = spawn_fixture().await;
    let fetcher = TopStoriesFetcher::new(http_client("prism-test/1.0").unwrap(), format!("{base}/v0"));

    let items = fetcher.fetch("Hacker News").await;
    // item 2 has no destination url, item 3 is null; neither may be faked
    assert_eq!(items.len(), 1);
    let story = &items[0];
    assert_eq!(story.title, "Show HN: prism");
    assert_eq!(story.url, "https://www.example.com/prism");
    assert_eq!(story.domain, "example.com");
    assert_eq!(story.score, 120);
    assert_eq!(story.author, "alice");
    assert_eq!(story.external_id, "1");
    assert_eq!(story.comments_url, "https://news.ycombinator.com/item?id=1");
    assert_eq!(story.source_name, "Hacker News");
}

#[tokio::test]
async fn discovery_registers_feed_once() {
    let base = spawn_fixture().await;
    let registry = memory_registry().await;
    let discovery = Discovery::new(http_client("prism-test/1.0").unwrap(), registry.clone());

    let article = format!("{base}/article");
    let host = base.trim_start_matches("http://").to_string();
    let batch = vec![sample_item(&article, &host)];

    discovery.run(&batch).await;
    let found = format!("{base}/found.xml");
    assert!(registry.contains_url(&found).await.unwrap());
    let pending = registry.unclassified().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].category, PROVISIONAL_CATEGORY);
    assert_eq!(pending[0].kind, SourceKind::Rss);
    assert!(pending[0].enabled);

    // a second pass over the same article must not create a duplicate row
    discovery.run(&batch).await;
    assert_eq!(registry.count().await.unwrap(), 1);
}

#[tokio::test]
async fn discovery_never_fetches_denylisted_domains() {
    let base = spawn_fixture().await;
    let registry = memory_registry().await;
    let discovery = Discovery::new(http_client("prism-test/1.0").unwrap(), registry.clone());

    // the page itself advertises a feed, but the domain label is denylisted
    let batch = vec![
        sample_item(&format!("{base}/article"), "github.com"),
        sample_item("https://self.invalid/x", "Self"),
    ];
    discovery.run(&batch).await;
    assert_eq!(registry.count().await.unwrap(), 0);
}

#[tokio::test]
async fn classifier_promotes_confident_feeds_only() {
    let base = spawn_fixture().await;
    let registry = memory_registry().await;
    registry
        .insert("ai.fixture", &format!("{base}/ai.xml"), PROVISIONAL_CATEGORY, SourceKind::Rss)
        .await
        .unwrap();
    registry
        .insert("neutral.fixture", &format!("{base}/neutral.xml"), PROVISIONAL_CATEGORY, SourceKind::Rss)
        .await
        .unwrap();
    registry
        .insert("dead.fixture", &format!("{base}/gone.xml"), PROVISIONAL_CATEGORY, SourceKind::Rss)
        .await
        .unwrap();

    let classifier = Classifier::new(
        FeedFetcher::new(http_client("prism-test/1.0").unwrap()),
        registry.clone(),
    );
    classifier.run().await;

    let ai_feeds = registry.feeds_in_category("ai").await.unwrap();
    assert_eq!(ai_feeds.len(), 1);
    assert_eq!(ai_feeds[0].name, "ai.fixture");

    // low-confidence and unreachable sources stay pending for a later cycle
    let pending = registry.unclassified().await.unwrap();
    let names: Vec<&str> = pending.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["neutral.fixture", "dead.fixture"]);
}

#[tokio::test]
async fn registry_seeds_only_when_empty() {
    let registry = memory_registry().await;
    registry.seed_if_empty().await.unwrap();
    let seeded = registry.count().await.unwrap();
    assert!(seeded > 0);

    registry.seed_if_empty().await.unwrap();
    assert_eq!(registry.count().await.unwrap(), seeded);

    let categories = registry.enabled_categories().await.unwrap();
    assert!(categories.contains(&"tech".to_string()));
    let tech = registry.feeds_in_category("tech").await.unwrap();
    assert!(tech.iter().any(|f| f.kind == SourceKind::Hn));
}

#[tokio::test]
async fn disabled_feeds_are_excluded_from_aggregation() {
    let registry = memory_registry().await;
    registry
        .insert("a", "https://a.invalid/feed", "tech", SourceKind::Rss)
        .await
        .unwrap();
    let id = registry.feeds_in_category("tech").await.unwrap()[0].id;
    registry.set_enabled(id, false).await.unwrap();
    assert!(registry.feeds_in_category("tech").await.unwrap().is_empty());
    assert!(registry.enabled_categories().await.unwrap().is_empty());
}

#[tokio::test]
async fn read_api_serves_cache_or_empty_array() {
    let cache = NewsCache::new();
    cache
        .set(&news_key("tech"), r#"[{"title":"t"}]"#.to_string())
        .await;

    let app = api::router(ApiState { cache });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = reqwest::Client::new();
    let hit = client
        .get(format!("http://{addr}/api/news?category=tech"))
        .send()
        .await
        .unwrap();
    assert_eq!(hit.headers()["content-type"], "application/json");
    assert_eq!(hit.text().await.unwrap(), r#"[{"title":"t"}]"#);

    let miss = client
        .get(format!("http://{addr}/api/news?category=gaming"))
        .send()
        .await
        .unwrap();
    assert_eq!(miss.text().await.unwrap(), "[]");

    let health = client
        .get(format!("http://{addr}/healthz"))
        .send()
        .await
        .unwrap();
    assert_eq!(health.text().await.unwrap(), "ok");
}
