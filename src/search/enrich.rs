use futures_util::stream::{self, StreamExt};
use std::collections::HashMap;

use crate::models::{BrandRecord, ScoredItem};
use crate::search::brand::BrandLookup;

/// Attaches brand-index metadata to ranked products.
pub struct ResultEnricher {
    lookup: BrandLookup,
    max_concurrency: usize,
}

impl ResultEnricher {
    pub fn new(lookup: BrandLookup, max_concurrency: usize) -> Self {
        Self {
            lookup,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Set `brand_info` on every item that names a brand. Each distinct brand
    /// is looked up once; items without a brand pass through untouched.
    pub async fn enrich(&self, mut items: Vec<ScoredItem>) -> Vec<ScoredItem> {
        let mut brands: Vec<String> = Vec::new();
        for item in &items {
            let brand = item.brand();
            if !brand.is_empty() && !brands.contains(&brand) {
                brands.push(brand);
            }
        }

        if brands.is_empty() {
            return items;
        }

        let infos: HashMap<String, BrandRecord> = stream::iter(brands)
            .map(|brand| async move {
                let info = self.brand_info(&brand).await;
                (brand, info)
            })
            .buffered(self.max_concurrency)
            .collect()
            .await;

        for item in &mut items {
            if let Some(info) = infos.get(&item.brand()) {
                item.brand_info = Some(info.clone());
            }
        }

        items
    }

    async fn brand_info(&self, brand: &str) -> BrandRecord {
        match self.lookup.search(brand, 1).await {
            Ok(matches) => match matches.into_iter().next() {
                Some(top) => BrandRecord::from_metadata(&top.metadata),
                None => BrandRecord::named(brand),
            },
            Err(e) => {
                tracing::warn!("Brand info lookup for '{brand}' failed: {e:#}");
                BrandRecord::named(brand)
            }
        }
    }
}
