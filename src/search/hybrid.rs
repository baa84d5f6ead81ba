use anyhow::Result;
use futures_util::stream::{self, StreamExt};
use std::sync::Arc;

use crate::config::{CallLimits, RankingConfig};
use crate::index::VectorIndex;
use crate::llm::embeddings::Embedder;
use crate::models::{metadata_f32, IndexMatch, ScoredItem, SearchResult};
use crate::retry::call_with_retry;
use crate::search::brand::{BrandLookup, BrandResolver};
use crate::search::enrich::ResultEnricher;
use crate::search::keyword::{KeywordScorer, ProductFields};
use crate::search::Providers;

/// Score one product neighbour.
///
/// `search_weight` (default 1.0) scales both the vector and the keyword
/// score; the combined score adds the keyword score scaled by `keyword_blend`.
pub fn score_match(
    scorer: &KeywordScorer,
    keyword_blend: f32,
    query: &str,
    m: IndexMatch,
) -> ScoredItem {
    let search_weight = metadata_f32(&m.metadata, "search_weight")
        .filter(|w| w.is_finite())
        .unwrap_or(1.0);

    let fields = ProductFields::from_metadata(&m.metadata);
    let keyword_score = scorer.score(query, &fields) * search_weight;
    let vector_score = m.score * search_weight;
    let combined_score = vector_score + keyword_score * keyword_blend;

    ScoredItem {
        id: m.id,
        vector_score,
        keyword_score,
        combined_score,
        metadata: m.metadata,
        query_brand: None,
        brand_info: None,
    }
}

/// Stable sort by combined score, highest first. Ties keep their order.
fn sort_by_combined(items: &mut [ScoredItem]) {
    items.sort_by(|a, b| {
        b.combined_score
            .partial_cmp(&a.combined_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Query interpretation plus vector/keyword ranking over the product index.
pub struct HybridRanker {
    embedder: Arc<dyn Embedder>,
    products: Arc<dyn VectorIndex>,
    resolver: BrandResolver,
    enricher: ResultEnricher,
    scorer: KeywordScorer,
    ranking: RankingConfig,
    limits: CallLimits,
}

impl HybridRanker {
    pub fn new(providers: Providers, ranking: RankingConfig, limits: CallLimits) -> Self {
        let lookup =
            BrandLookup::new(providers.embedder.clone(), providers.brands, limits.clone());
        let resolver = BrandResolver::new(
            lookup.clone(),
            providers.generator,
            &ranking,
            limits.clone(),
        );
        let enricher = ResultEnricher::new(lookup, limits.max_concurrency);

        Self {
            embedder: providers.embedder,
            products: providers.products,
            resolver,
            enricher,
            scorer: KeywordScorer::new(ranking.keyword_weights),
            ranking,
            limits,
        }
    }

    pub fn resolver(&self) -> &BrandResolver {
        &self.resolver
    }

    pub fn default_top_k(&self) -> usize {
        self.ranking.default_top_k
    }

    /// Top `k` products for `query`, ranked by combined score.
    ///
    /// Never fails: provider errors and timeouts are logged and produce an
    /// empty list.
    pub async fn search_products(&self, query: &str, k: usize) -> Vec<ScoredItem> {
        if k == 0 {
            return Vec::new();
        }

        match self.try_search_products(query, k).await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!("Product search for '{query}' failed: {e:#}");
                Vec::new()
            }
        }
    }

    async fn try_search_products(&self, query: &str, k: usize) -> Result<Vec<ScoredItem>> {
        let vector = call_with_retry(&self.limits, "query embedding", || {
            self.embedder.embed(query)
        })
        .await?;

        // Over-fetch so keyword matches can lift items the vectors ranked lower
        let fetch = k.saturating_mul(self.ranking.candidate_multiplier.max(1));
        let matches = call_with_retry(&self.limits, "product index query", || {
            self.products.query(&vector, fetch, true)
        })
        .await?;

        let mut items: Vec<ScoredItem> = matches
            .into_iter()
            .map(|m| score_match(&self.scorer, self.ranking.keyword_blend, query, m))
            .collect();

        sort_by_combined(&mut items);
        items.truncate(k);

        tracing::debug!("'{query}': {} candidates kept of {fetch} requested", items.len());
        Ok(items)
    }

    /// Full pipeline: brand-centric expansion when the query asks for brands
    /// similar to one it names, general product search otherwise. Always
    /// returns a well-formed result.
    pub async fn hybrid_search(&self, query: &str, k: usize) -> SearchResult {
        if self.resolver.is_brand_centric(query) {
            match self.resolver.extract_brand(query).await {
                Ok(Some(brand)) => {
                    if let Some(result) = self.brand_centric_search(query, &brand, k).await {
                        return result;
                    }
                }
                Ok(None) => {
                    tracing::info!("Brand-centric query without a brand, using general search");
                }
                Err(e) => {
                    tracing::warn!("{e:#}; using general search");
                }
            }
        }

        let results = self.search_products(query, k).await;
        SearchResult::General {
            results: self.enricher.enrich(results).await,
        }
    }

    /// `None` when no similar brand is found, so the caller falls back to a
    /// general search.
    async fn brand_centric_search(
        &self,
        query: &str,
        brand: &str,
        k: usize,
    ) -> Option<SearchResult> {
        let similar_brands = self
            .resolver
            .similar_brands(brand, self.ranking.similar_brand_count)
            .await;

        if similar_brands.is_empty() {
            tracing::info!("No brands similar to '{brand}', using general search");
            return None;
        }

        tracing::info!("Brand-centric query for '{brand}', similar: {similar_brands:?}");

        let product_type = self.resolver.product_type(query, brand);
        let per_brand = self.ranking.per_brand_top_k;
        let all_brands: Vec<String> = std::iter::once(brand.to_string())
            .chain(similar_brands.iter().cloned())
            .collect();

        // `buffered` keeps brand order so ties resolve deterministically
        let batches: Vec<Vec<ScoredItem>> = stream::iter(all_brands)
            .map(|b| {
                let sub_query = format!("{b} {product_type}");
                async move {
                    let mut items = self.search_products(&sub_query, per_brand).await;
                    for item in &mut items {
                        item.query_brand = Some(b.clone());
                    }
                    items
                }
            })
            .buffered(self.limits.max_concurrency.max(1))
            .collect()
            .await;

        let mut pool: Vec<ScoredItem> = batches.into_iter().flatten().collect();
        sort_by_combined(&mut pool);
        pool.truncate(k);

        Some(SearchResult::BrandCentric {
            original_brand: brand.to_string(),
            similar_brands,
            results: self.enricher.enrich(pool).await,
        })
    }
}
