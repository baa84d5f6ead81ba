use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, VectorBackend};
use crate::index::local::LocalIndex;
use crate::index::pinecone::PineconeIndex;
use crate::index::VectorIndex;
use crate::llm::completion::HttpTextGenerator;
use crate::llm::embeddings::HttpEmbedder;
use crate::search::hybrid::HybridRanker;
use crate::search::Providers;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub ranker: Arc<HybridRanker>,
}

impl AppState {
    /// Build the provider clients from configuration and wire them into the ranker.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .build()?;

        let (products, brands): (Arc<dyn VectorIndex>, Arc<dyn VectorIndex>) =
            match config.index.backend {
                VectorBackend::Pinecone => {
                    let api_key = config
                        .index
                        .api_key
                        .as_deref()
                        .context("PINECONE_API_KEY is required for the pinecone backend")?;
                    let products = PineconeIndex::connect(
                        http_client.clone(),
                        api_key,
                        &config.index.control_url,
                        &config.index.products_index,
                        config.index.products_host.as_deref(),
                    )
                    .await?;
                    let brands = PineconeIndex::connect(
                        http_client.clone(),
                        api_key,
                        &config.index.control_url,
                        &config.index.brands_index,
                        config.index.brands_host.as_deref(),
                    )
                    .await?;
                    (Arc::new(products), Arc::new(brands))
                }
                VectorBackend::Local => {
                    let products = LocalIndex::open(&config.products_snapshot())?;
                    let brands = LocalIndex::open(&config.brands_snapshot())?;
                    tracing::info!(
                        "Local indexes loaded: {} products, {} brands",
                        products.entry_count(),
                        brands.entry_count()
                    );
                    (Arc::new(products), Arc::new(brands))
                }
            };

        let providers = Providers {
            embedder: Arc::new(HttpEmbedder::new(http_client.clone(), config.llm.clone())),
            generator: Arc::new(HttpTextGenerator::new(http_client, config.llm.clone())),
            products,
            brands,
        };

        Ok(Self::with_providers(config, providers))
    }

    /// State over already-constructed providers.
    pub fn with_providers(config: Config, providers: Providers) -> Self {
        let ranker = HybridRanker::new(providers, config.ranking.clone(), config.limits.clone());
        Self {
            config,
            ranker: Arc::new(ranker),
        }
    }
}
