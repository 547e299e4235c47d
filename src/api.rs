use crate::cache::{news_key, NewsCache};
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

/// The read path is a thin read-through over the cache: it never triggers
/// fetching and never blocks on a cycle in progress.
#[derive(Clone)]
pub struct ApiState {
    pub cache: NewsCache,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/news", get(news))
        .route("/healthz", get(healthz))
        .with_state(state)
}

#[derive(Deserialize)]
struct NewsQuery {
    category: Option<String>,
}

/// `GET /api/news?category=<cat>` — the cached JSON array for the
/// category, or `[]` when absent or expired.
async fn news(State(state): State<ApiState>, Query(query): Query<NewsQuery>) -> impl IntoResponse {
    let category = query.category.unwrap_or_else(|| "tech".to_string());
    let body = state
        .cache
        .get(&news_key(&category))
        .await
        .unwrap_or_else(|| "[]".to_string());
    ([(header::CONTENT_TYPE, "application/json")], body)
}

async fn healthz() -> &'static str {
    "ok"
}
