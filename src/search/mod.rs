pub mod brand;
pub mod enrich;
pub mod hybrid;
pub mod keyword;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use crate::index::VectorIndex;
use crate::llm::completion::TextGenerator;
use crate::llm::embeddings::Embedder;

/// External services the ranker depends on. Built once at startup and shared.
#[derive(Clone)]
pub struct Providers {
    pub embedder: Arc<dyn Embedder>,
    pub generator: Arc<dyn TextGenerator>,
    pub products: Arc<dyn VectorIndex>,
    pub brands: Arc<dyn VectorIndex>,
}
