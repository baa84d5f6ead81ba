use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::models::{SearchRequest, SearchResponse, SearchResult};
use crate::state::AppState;

const MAX_LIMIT: usize = 50;

/// POST /api/search - Hybrid product search:
///   1. Brand-centric detection and brand extraction (LLM)
///   2. Similar-brand discovery and one product search per brand, or a
///      single general product search
///   3. Vector + keyword scoring, merge, top-k
///   4. Brand metadata enrichment
pub async fn search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let query = req.query.trim().to_string();
    if query.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Query is required".to_string()));
    }

    let limit = req
        .limit
        .unwrap_or_else(|| state.ranker.default_top_k())
        .clamp(1, MAX_LIMIT);

    let result = state.ranker.hybrid_search(&query, limit).await;

    match &result {
        SearchResult::General { results } => {
            tracing::info!("General search '{query}': {} results", results.len());
        }
        SearchResult::BrandCentric {
            original_brand,
            similar_brands,
            results,
        } => {
            tracing::info!(
                "Brand-centric search '{query}' ({original_brand} + {}): {} results",
                similar_brands.join(", "),
                results.len()
            );
        }
    }

    Ok(Json(SearchResponse { query, result }))
}

/// GET /api/health
pub async fn health() -> &'static str {
    "ok"
}
