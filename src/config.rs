use clap::Parser;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; PrismBot/1.0)";

/// Runtime configuration, from CLI flags with environment fallbacks.
#[derive(Debug, Clone, Parser)]
#[command(name = "prism", about = "Category-grouped news aggregation service")]
pub struct Config {
    /// SQLite database holding the feed registry.
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:prism.db")]
    pub database_url: String,

    /// Address the read API listens on.
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:5051")]
    pub listen_addr: String,

    /// Seconds between aggregation cycles.
    #[arg(long, env = "CYCLE_INTERVAL_SECS", default_value_t = 600)]
    pub cycle_interval_secs: u64,

    /// User agent sent on all outbound requests. Many feed hosts reject
    /// default client signatures.
    #[arg(long, env = "USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Base URL of the Hacker News item API.
    #[arg(long, env = "HN_API_BASE", default_value = "https://hacker-news.firebaseio.com/v0")]
    pub hn_api_base: String,
}

impl Config {
    pub fn cycle_interval(&self) -> Duration {
        Duration::from_secs(self.cycle_interval_secs)
    }

    /// Cache entries outlive two cycles so a stalled scheduler cannot
    /// serve indefinitely stale data.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cycle_interval_secs * 2)
    }
}
