use axum::routing::{get, post};
use axum::Router;
use tracing_subscriber::EnvFilter;

use brand_search::api;
use brand_search::config::Config;
use brand_search::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!("LLM provider: {} ({})", config.llm.provider, config.llm.base_url);
    tracing::info!(
        "Indexes: products='{}', brands='{}' ({:?})",
        config.index.products_index,
        config.index.brands_index,
        config.index.backend
    );

    let state = AppState::new(config.clone()).await?;

    let app = Router::new()
        .route("/api/health", get(api::search::health))
        .route("/api/search", post(api::search::search))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
