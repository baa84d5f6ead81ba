use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Metadata bag returned by the vector indexes. Values are strings or numbers.
pub type Metadata = serde_json::Map<String, Value>;

/// Read a metadata field as text. Numbers are rendered, anything else is `None`.
pub fn metadata_str(metadata: &Metadata, key: &str) -> Option<String> {
    match metadata.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Read a metadata field as a number, accepting numeric strings.
pub fn metadata_f32(metadata: &Metadata, key: &str) -> Option<f32> {
    match metadata.get(key)? {
        Value::Number(n) => n.as_f64().map(|v| v as f32),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// A single neighbour returned by a vector index query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMatch {
    pub id: String,
    pub score: f32,
    #[serde(default)]
    pub metadata: Metadata,
}

/// Brand metadata as stored in the brand index.
///
/// Known fields are lifted out; anything else the index returns is kept in
/// `extra` and serialized back flat, so a record round-trips unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrandRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_name_en: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_name_ko: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_of_origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competing_brands: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_customers: Option<String>,
    #[serde(flatten)]
    pub extra: Metadata,
}

/// Sentinel stored in `competing_brands` when the catalog has no data.
pub const UNKNOWN_COMPETITORS: &str = "Unknown";

impl BrandRecord {
    /// Minimal record attached when a brand has no entry in the brand index.
    pub fn named(brand: &str) -> Self {
        Self {
            brand_name_en: Some(brand.to_string()),
            ..Self::default()
        }
    }

    /// Build a record from raw index metadata. Numeric values in the known
    /// text fields are rendered to strings rather than rejected.
    pub fn from_metadata(metadata: &Metadata) -> Self {
        let mut extra = metadata.clone();
        let mut take = |key: &str| {
            let value = metadata_str(metadata, key);
            extra.remove(key);
            value
        };

        let brand_name_en = take("brand_name_en");
        let brand_name_ko = take("brand_name_ko");
        let country_of_origin = take("country_of_origin");
        let main_category = take("main_category");
        let sub_category = take("sub_category");
        let price_range = take("price_range");
        let competing_brands = take("competing_brands");
        let brand_description = take("brand_description");
        let target_customers = take("target_customers");

        Self {
            brand_name_en,
            brand_name_ko,
            country_of_origin,
            main_category,
            sub_category,
            price_range,
            competing_brands,
            brand_description,
            target_customers,
            extra,
        }
    }

    /// Competing brands listed on the record, or empty for the "Unknown" sentinel.
    pub fn competitors(&self) -> Vec<String> {
        match self.competing_brands.as_deref() {
            None | Some(UNKNOWN_COMPETITORS) => Vec::new(),
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|b| !b.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// Query text for brands in the same category and price band, when the
    /// record carries all three fields.
    pub fn category_query(&self) -> Option<String> {
        match (&self.main_category, &self.sub_category, &self.price_range) {
            (Some(main), Some(sub), Some(price)) => Some(format!("{main} {sub} {price}")),
            _ => None,
        }
    }
}

/// A ranked product with its score breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredItem {
    pub id: String,
    pub vector_score: f32,
    pub keyword_score: f32,
    pub combined_score: f32,
    pub metadata: Metadata,
    /// Brand whose sub-query produced this item (brand-centric search only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_brand: Option<String>,
    /// Brand metadata attached by enrichment. Absent means unknown brand.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_info: Option<BrandRecord>,
}

impl ScoredItem {
    /// The product's `brand` field, or "" when missing.
    pub fn brand(&self) -> String {
        metadata_str(&self.metadata, "brand").unwrap_or_default()
    }
}

/// Outcome of one hybrid search.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "query_type", rename_all = "snake_case")]
pub enum SearchResult {
    General {
        results: Vec<ScoredItem>,
    },
    BrandCentric {
        original_brand: String,
        similar_brands: Vec<String>,
        results: Vec<ScoredItem>,
    },
}

impl SearchResult {
    pub fn results(&self) -> &[ScoredItem] {
        match self {
            SearchResult::General { results } | SearchResult::BrandCentric { results, .. } => {
                results
            }
        }
    }

    pub fn is_brand_centric(&self) -> bool {
        matches!(self, SearchResult::BrandCentric { .. })
    }
}

/// Search request
#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    /// Falls back to the configured default when absent
    pub limit: Option<usize>,
}

/// Search response
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub query: String,
    #[serde(flatten)]
    pub result: SearchResult,
}
