pub mod aggregator;
pub mod api;
pub mod cache;
pub mod classifier;
pub mod config;
pub mod discovery;
pub mod registry;
pub mod sources;
pub mod types;

pub use aggregator::Aggregator;
pub use cache::{news_key, NewsCache};
pub use classifier::Classifier;
pub use config::Config;
pub use discovery::Discovery;
pub use registry::{FeedRegistry, PROVISIONAL_CATEGORY};
pub use sources::{http_client, FeedFetcher, TopStoriesFetcher};
pub use types::{Feed, NewsError, NewsItem, Result, SourceKind};
