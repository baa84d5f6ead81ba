use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address
    pub bind_addr: String,
    /// Embedding + completion provider configuration
    pub llm: LlmConfig,
    /// Product and brand index configuration
    pub index: IndexConfig,
    /// Scoring weights and result-size defaults
    pub ranking: RankingConfig,
    /// Timeouts, concurrency and retry policy for external calls
    pub limits: CallLimits,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "ollama" or "openai"
    pub provider: String,
    /// Base URL for the LLM API
    pub base_url: String,
    /// Model name for brand extraction
    pub chat_model: String,
    /// Model name for embeddings
    pub embedding_model: String,
    /// API key (only needed for cloud providers)
    pub api_key: Option<String>,
    /// Sampling temperature for brand extraction
    pub temperature: f32,
}

/// Which vector index implementation backs the two catalogs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorBackend {
    /// Hosted Pinecone indexes
    Pinecone,
    /// Read-only JSON snapshots loaded into memory
    Local,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    pub backend: VectorBackend,
    pub api_key: Option<String>,
    /// Pinecone control plane, used to resolve an index host by name
    pub control_url: String,
    pub products_index: String,
    pub brands_index: String,
    /// Data-plane host for the products index. Resolved by name when unset.
    pub products_host: Option<String>,
    /// Data-plane host for the brands index. Resolved by name when unset.
    pub brands_host: Option<String>,
    /// Directory holding `products.json` / `brands.json` for the local backend
    pub data_dir: PathBuf,
}

/// Per-field weights used by the keyword scorer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeywordWeights {
    pub name: f32,
    pub brand: f32,
    pub description: f32,
}

impl Default for KeywordWeights {
    fn default() -> Self {
        Self {
            name: 5.0,
            brand: 3.0,
            description: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    pub keyword_weights: KeywordWeights,
    /// Factor applied to the keyword score before adding it to the vector score
    pub keyword_blend: f32,
    /// Neighbours fetched per result slot before re-ranking
    pub candidate_multiplier: usize,
    /// Results returned by a search when the caller gives no limit
    pub default_top_k: usize,
    /// Products fetched per brand on the brand-centric path
    pub per_brand_top_k: usize,
    /// Similar brands discovered for a brand-centric query
    pub similar_brand_count: usize,
    /// Phrases that mark a query as "similar to brand X"
    pub brand_markers: Vec<String>,
    /// Appended to a brand name when looking up its own record
    pub brand_query_suffix: String,
    /// Product type used when nothing is left after stripping brand and markers
    pub default_product_type: String,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            keyword_weights: KeywordWeights::default(),
            keyword_blend: 0.1,
            candidate_multiplier: 3,
            default_top_k: 5,
            per_brand_top_k: 2,
            similar_brand_count: 3,
            brand_markers: [
                "와 비슷한",
                "와 같은",
                "와 유사한",
                "스타일의",
                "같은 스타일",
                "like",
                "similar to",
                "same as",
                "style of",
                "similar brand",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            brand_query_suffix: "브랜드".to_string(),
            default_product_type: "제품".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallLimits {
    /// Timeout applied to every embedding, index and completion call
    pub call_timeout_secs: u64,
    /// Upper bound on in-flight external calls within one request
    pub max_concurrency: usize,
    /// Extra attempts after a failed external call
    pub max_retries: u32,
    /// First retry delay; doubles on each further attempt
    pub retry_backoff_ms: u64,
}

impl CallLimits {
    /// Raise a zero call timeout or concurrency limit to 1.
    pub fn clamp_to_usable(&mut self) {
        self.call_timeout_secs = self.call_timeout_secs.max(1);
        self.max_concurrency = self.max_concurrency.max(1);
    }
}

impl Default for CallLimits {
    fn default() -> Self {
        Self {
            call_timeout_secs: 15,
            max_concurrency: 4,
            max_retries: 1,
            retry_backoff_ms: 200,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:9000".to_string(),
            llm: LlmConfig::default(),
            index: IndexConfig::default(),
            ranking: RankingConfig::default(),
            limits: CallLimits::default(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            base_url: "https://api.openai.com".to_string(),
            chat_model: "gpt-4o".to_string(),
            embedding_model: "text-embedding-ada-002".to_string(),
            api_key: None,
            temperature: 0.2,
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            backend: VectorBackend::Pinecone,
            api_key: None,
            control_url: "https://api.pinecone.io".to_string(),
            products_index: "sivillage-products".to_string(),
            brands_index: "sivillage-brands".to_string(),
            products_host: None,
            brands_host: None,
            data_dir: PathBuf::from("./data"),
        }
    }
}

/// Overwrite `slot` with the parsed value of `var`, leaving it alone when the
/// variable is unset or does not parse.
fn parse_env<T: std::str::FromStr>(var: &str, slot: &mut T) {
    if let Ok(val) = std::env::var(var) {
        if let Ok(v) = val.trim().parse() {
            *slot = v;
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("BRAND_SEARCH_BIND_ADDR") {
            config.bind_addr = addr;
        }

        // LLM config
        if let Ok(provider) = std::env::var("LLM_PROVIDER") {
            config.llm.provider = provider;
        }
        if let Ok(url) = std::env::var("LLM_BASE_URL") {
            config.llm.base_url = url;
        }
        if let Ok(model) = std::env::var("LLM_CHAT_MODEL") {
            config.llm.chat_model = model;
        }
        if let Ok(model) = std::env::var("LLM_EMBEDDING_MODEL") {
            config.llm.embedding_model = model;
        }
        let api_key = std::env::var("LLM_API_KEY")
            .or_else(|_| std::env::var("OPENAI_API_KEY"));
        if let Ok(key) = api_key {
            config.llm.api_key = Some(key);
        }
        parse_env("LLM_TEMPERATURE", &mut config.llm.temperature);

        // Index config
        if let Ok(backend) = std::env::var("VECTOR_BACKEND") {
            match backend.trim().to_ascii_lowercase().as_str() {
                "pinecone" => config.index.backend = VectorBackend::Pinecone,
                "local" => config.index.backend = VectorBackend::Local,
                other => tracing::warn!("Ignoring unknown VECTOR_BACKEND '{other}'"),
            }
        }
        if let Ok(key) = std::env::var("PINECONE_API_KEY") {
            config.index.api_key = Some(key);
        }
        if let Ok(url) = std::env::var("PINECONE_CONTROL_URL") {
            config.index.control_url = url;
        }
        if let Ok(name) = std::env::var("PRODUCTS_INDEX_NAME") {
            config.index.products_index = name;
        }
        if let Ok(name) = std::env::var("BRANDS_INDEX_NAME") {
            config.index.brands_index = name;
        }
        if let Ok(host) = std::env::var("PRODUCTS_INDEX_HOST") {
            config.index.products_host = Some(host);
        }
        if let Ok(host) = std::env::var("BRANDS_INDEX_HOST") {
            config.index.brands_host = Some(host);
        }
        if let Ok(dir) = std::env::var("BRAND_SEARCH_DATA_DIR") {
            config.index.data_dir = PathBuf::from(dir);
        }

        // Ranking config
        let ranking = &mut config.ranking;
        parse_env("SEARCH_TOP_K", &mut ranking.default_top_k);
        parse_env("SEARCH_PER_BRAND_TOP_K", &mut ranking.per_brand_top_k);
        parse_env("SEARCH_SIMILAR_BRANDS", &mut ranking.similar_brand_count);
        parse_env(
            "SEARCH_CANDIDATE_MULTIPLIER",
            &mut ranking.candidate_multiplier,
        );
        parse_env("SEARCH_KEYWORD_BLEND", &mut ranking.keyword_blend);
        parse_env("SEARCH_NAME_WEIGHT", &mut ranking.keyword_weights.name);
        parse_env("SEARCH_BRAND_WEIGHT", &mut ranking.keyword_weights.brand);
        parse_env(
            "SEARCH_DESCRIPTION_WEIGHT",
            &mut ranking.keyword_weights.description,
        );

        // Call limits
        let limits = &mut config.limits;
        parse_env("SEARCH_CALL_TIMEOUT_SECS", &mut limits.call_timeout_secs);
        parse_env("SEARCH_MAX_CONCURRENCY", &mut limits.max_concurrency);
        parse_env("SEARCH_MAX_RETRIES", &mut limits.max_retries);
        parse_env("SEARCH_RETRY_BACKOFF_MS", &mut limits.retry_backoff_ms);
        limits.clamp_to_usable();

        config
    }

    pub fn products_snapshot(&self) -> PathBuf {
        self.index.data_dir.join("products.json")
    }

    pub fn brands_snapshot(&self) -> PathBuf {
        self.index.data_dir.join("brands.json")
    }
}
