//! # brand-search
//!
//! Hybrid product/brand search over a vector-indexed catalog, serving a
//! conversational shopping assistant. Queries are ranked by vector
//! similarity blended with substring keyword matches and a per-product
//! business weight; queries like "bags similar to Balenciaga" are expanded
//! into one search per similar brand.
//!
//! ## Pipeline
//!
//! ```text
//!                       ┌──────────────┐
//!                       │  User Query  │
//!                       └──────┬───────┘
//!                              │
//!                   ┌──────────▼──────────┐
//!                   │ Brand-centric marker │
//!                   │  ("와 비슷한", ...)   │
//!                   └─────┬─────────┬─────┘
//!                     yes │         │ no
//!          ┌──────────────▼───┐     │
//!          │ LLM: extract brand│     │
//!          └──────────────┬───┘     │
//!          ┌──────────────▼───────┐ │
//!          │ Similar brands       │ │
//!          │  competitors, then   │ │
//!          │  category neighbours │ │
//!          └───┬──────────────┬───┘ │
//!     found    │              │ none│
//!   ┌──────────▼─────────┐    └─────┤
//!   │ "{brand} {type}"   │          │
//!   │ per brand, top 2   │   ┌──────▼───────────┐
//!   └──────────┬─────────┘   │ General search   │
//!              │             │  top k           │
//!              │             └──────┬───────────┘
//!              │  vector×weight + keyword×weight×0.1
//!              └────────┬───────────┘
//!                       ▼
//!           ┌───────────────────────┐
//!           │ Merge, stable sort,   │
//!           │ keep top k            │
//!           └───────────┬───────────┘
//!                       ▼
//!           ┌───────────────────────┐
//!           │ Brand info enrichment │
//!           │ (one lookup per brand)│
//!           └───────────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration: providers, indexes, ranking, call limits
//! - [`models`] - Shared data types: `ScoredItem`, `BrandRecord`, `SearchResult`, API types
//! - [`index`] - `VectorIndex` trait with Pinecone and local-snapshot implementations
//! - [`llm::embeddings`] - Query embeddings via Ollama or OpenAI-compatible APIs
//! - [`llm::completion`] - Text generation used for brand extraction
//! - [`search::keyword`] - Weighted substring keyword scorer
//! - [`search::brand`] - Brand-centric detection, brand extraction, similar-brand discovery
//! - [`search::hybrid`] - Product scoring and the full hybrid search pipeline
//! - [`search::enrich`] - Brand metadata enrichment of ranked products
//! - [`retry`] - Per-call timeout and bounded retry for external providers
//! - [`api`] - Axum HTTP handlers
//! - [`state`] - Shared application state holding the ranker

pub mod api;
pub mod config;
pub mod index;
pub mod llm;
pub mod models;
pub mod retry;
pub mod search;
pub mod state;
