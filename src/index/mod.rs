//! Read-only nearest-neighbour indexes over the product and brand catalogs.

pub mod local;
pub mod pinecone;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::IndexMatch;

/// A vector index that returns the `top_k` nearest stored items, ordered by
/// similarity descending.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        include_metadata: bool,
    ) -> Result<Vec<IndexMatch>>;
}
