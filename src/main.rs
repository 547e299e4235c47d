use clap::Parser;
use prism::api::{self, ApiState};
use prism::{http_client, Aggregator, Config, FeedRegistry, NewsCache};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::parse();
    info!("starting prism news aggregator");

    let registry = FeedRegistry::connect(&config.database_url).await?;
    registry.ensure_schema().await?;
    registry.seed_if_empty().await?;

    let cache = NewsCache::new();
    let client = http_client(&config.user_agent)?;

    let aggregator = Aggregator::new(
        registry,
        cache.clone(),
        client,
        &config.hn_api_base,
        config.cache_ttl(),
    );
    let cycle_interval = config.cycle_interval();
    tokio::spawn(async move {
        aggregator.run(cycle_interval).await;
    });

    let app = api::router(ApiState { cache });
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!("read api listening on {}", config.listen_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
