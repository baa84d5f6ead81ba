//! Brand-centric query handling: detection, brand extraction and
//! similar-brand discovery against the brand index.

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::config::{CallLimits, RankingConfig};
use crate::index::VectorIndex;
use crate::llm::completion::{ChatMessage, TextGenerator};
use crate::llm::embeddings::Embedder;
use crate::models::{metadata_str, BrandRecord, IndexMatch};
use crate::retry::call_with_retry;

const EXTRACTION_PROMPT: &str = "다음 검색어에 언급된 브랜드 이름만 답하세요. \
     설명이나 따옴표 없이 브랜드 이름 하나만 출력하고, 브랜드가 없으면 아무것도 출력하지 마세요.\n\n\
     검색어: {query}\n\n\
     브랜드 이름:";

/// Text search over the brand index: embed, then nearest neighbours.
#[derive(Clone)]
pub struct BrandLookup {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    limits: CallLimits,
}

impl BrandLookup {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        limits: CallLimits,
    ) -> Self {
        Self {
            embedder,
            index,
            limits,
        }
    }

    pub async fn search(&self, text: &str, top_k: usize) -> Result<Vec<IndexMatch>> {
        let vector = call_with_retry(&self.limits, "brand query embedding", || {
            self.embedder.embed(text)
        })
        .await?;

        call_with_retry(&self.limits, "brand index query", || {
            self.index.query(&vector, top_k, true)
        })
        .await
    }
}

pub struct BrandResolver {
    lookup: BrandLookup,
    generator: Arc<dyn TextGenerator>,
    /// Marker phrases, lower-cased once up front
    markers: Vec<String>,
    brand_query_suffix: String,
    default_product_type: String,
    limits: CallLimits,
}

impl BrandResolver {
    pub fn new(
        lookup: BrandLookup,
        generator: Arc<dyn TextGenerator>,
        ranking: &RankingConfig,
        limits: CallLimits,
    ) -> Self {
        Self {
            lookup,
            generator,
            markers: ranking
                .brand_markers
                .iter()
                .map(|m| m.to_lowercase())
                .filter(|m| !m.is_empty())
                .collect(),
            brand_query_suffix: ranking.brand_query_suffix.clone(),
            default_product_type: ranking.default_product_type.clone(),
            limits,
        }
    }

    /// True when the query asks for something "similar to / same style as" a brand.
    pub fn is_brand_centric(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.markers.iter().any(|m| query.contains(m.as_str()))
    }

    /// Ask the completion model which brand the query refers to.
    ///
    /// `Ok(None)` means the model named no brand; `Err` means the provider
    /// call itself failed.
    pub async fn extract_brand(&self, query: &str) -> Result<Option<String>> {
        let messages = [ChatMessage::user(EXTRACTION_PROMPT.replace("{query}", query))];

        let reply = call_with_retry(&self.limits, "brand extraction", || {
            self.generator.generate(&messages)
        })
        .await
        .context("Brand extraction failed")?;

        let brand = reply.trim();
        if brand.is_empty() {
            Ok(None)
        } else {
            Ok(Some(brand.to_string()))
        }
    }

    /// Up to `k` distinct brands similar to `brand`, never including `brand`
    /// itself or the English/Korean names on its record. Listed competitors
    /// come first, then brands sharing its category and price range. Lookup
    /// failures yield fewer (or no) brands.
    pub async fn similar_brands(&self, brand: &str, k: usize) -> Vec<String> {
        if k == 0 {
            return Vec::new();
        }

        let record_query = format!("{brand} {}", self.brand_query_suffix);
        let record = match self.lookup.search(&record_query, 1).await {
            Ok(matches) => match matches.into_iter().next() {
                Some(m) => BrandRecord::from_metadata(&m.metadata),
                None => {
                    tracing::info!("No brand record found for '{brand}'");
                    return Vec::new();
                }
            },
            Err(e) => {
                tracing::warn!("Brand record lookup for '{brand}' failed: {e:#}");
                return Vec::new();
            }
        };

        // The extracted name may differ from the record's own names ("발렌시아가" vs "Balenciaga")
        let own_names: Vec<&str> = [
            Some(brand),
            record.brand_name_en.as_deref(),
            record.brand_name_ko.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect();

        let mut similar: Vec<String> = Vec::new();
        let mut add = |name: &str| {
            if !name.is_empty()
                && !own_names.contains(&name)
                && !similar.iter().any(|s| s == name)
            {
                similar.push(name.to_string());
            }
        };

        for competitor in record.competitors() {
            add(&competitor);
        }

        if let Some(category_query) = record.category_query() {
            match self.lookup.search(&category_query, k + 2).await {
                Ok(matches) => {
                    for m in &matches {
                        if let Some(name) = metadata_str(&m.metadata, "brand_name_en") {
                            add(&name);
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!("Category brand lookup '{category_query}' failed: {e:#}");
                }
            }
        }

        similar.truncate(k);
        tracing::debug!("Similar brands for '{brand}': {similar:?}");
        similar
    }

    /// What the user is shopping for once the brand and marker phrases are
    /// removed, e.g. "가방" from "구찌와 비슷한 가방".
    pub fn product_type(&self, query: &str, brand: &str) -> String {
        let mut remainder = remove_phrase(query, brand);
        for marker in &self.markers {
            remainder = remove_phrase(&remainder, marker);
        }

        let product_type = remainder.split_whitespace().collect::<Vec<_>>().join(" ");
        if product_type.is_empty() {
            self.default_product_type.clone()
        } else {
            product_type
        }
    }
}

/// Remove every occurrence of `phrase` from `text`, ignoring ASCII case.
fn remove_phrase(text: &str, phrase: &str) -> String {
    if phrase.is_empty() {
        return text.to_string();
    }

    let needle = phrase.as_bytes();
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut start = 0;
    let mut i = 0;

    while i + needle.len() <= bytes.len() {
        if text.is_char_boundary(i) && bytes[i..i + needle.len()].eq_ignore_ascii_case(needle) {
            out.push_str(&text[start..i]);
            i += needle.len();
            start = i;
        } else {
            i += 1;
        }
    }
    out.push_str(&text[start..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::testing::*;
    use serde_json::json;

    fn resolver(
        generator: FixedGenerator,
        brands: ScriptedIndex,
    ) -> (BrandResolver, Arc<ScriptedIndex>) {
        let (providers, _, brands) = providers(generator, ScriptedIndex::default(), brands);
        let limits = CallLimits {
            max_retries: 0,
            ..CallLimits::default()
        };
        let lookup = BrandLookup::new(providers.embedder, providers.brands, limits.clone());
        let resolver = BrandResolver::new(
            lookup,
            providers.generator,
            &RankingConfig::default(),
            limits,
        );
        (resolver, brands)
    }

    fn idle_resolver() -> BrandResolver {
        resolver(FixedGenerator::failing(), ScriptedIndex::default()).0
    }

    #[test]
    fn test_markers_detected() {
        let r = idle_resolver();
        assert!(r.is_brand_centric("발렌시아가와 비슷한 브랜드의 가방"));
        assert!(r.is_brand_centric("나이키와 같은 스타일의 운동화"));
        assert!(r.is_brand_centric("Bags SIMILAR TO Celine"));
        assert!(r.is_brand_centric("something in the style of Prada"));
    }

    #[test]
    fn test_plain_queries_not_brand_centric() {
        let r = idle_resolver();
        for query in [
            "여성용 가죽 가방",
            "프랑스 럭셔리 브랜드 지갑",
            "20대 여성을 위한 캐주얼 의류",
            "고급 손목시계",
            "",
        ] {
            assert!(!r.is_brand_centric(query), "{query}");
        }
    }

    #[test]
    fn test_marker_free_strings_never_match() {
        let r = idle_resolver();
        let alphabet = ["가방", "지갑", "red", "tote", "시계", "2024", "여름", "bag"];
        for a in alphabet {
            for b in alphabet {
                let query = format!("{a} {b}");
                assert!(!r.is_brand_centric(&query), "{query}");
            }
        }
    }

    #[test]
    fn test_product_type_strips_brand_and_markers() {
        let r = idle_resolver();
        assert_eq!(r.product_type("발렌시아가와 비슷한 브랜드의 가방", "발렌시아가"), "브랜드의 가방");
        assert_eq!(r.product_type("나이키와 같은 스타일의 운동화", "나이키"), "운동화");
        assert_eq!(
            r.product_type("Sneakers similar to NIKE", "Nike"),
            "Sneakers"
        );
    }

    #[test]
    fn test_product_type_defaults_when_empty() {
        let r = idle_resolver();
        assert_eq!(r.product_type("구찌와 비슷한", "구찌"), "제품");
        assert_eq!(r.product_type("similar to gucci", "Gucci"), "제품");
    }

    #[test]
    fn test_remove_phrase_ascii_case_and_unicode() {
        assert_eq!(remove_phrase("Gucci gucci GUCCI bag", "gucci"), "   bag");
        assert_eq!(remove_phrase("구찌와 같은 지갑", "와 같은"), "구찌 지갑");
        assert_eq!(remove_phrase("abc", ""), "abc");
        assert_eq!(remove_phrase("ab", "abc"), "ab");
    }

    #[tokio::test]
    async fn test_extract_brand_trims_reply() {
        let generator = FixedGenerator::replying("  발렌시아가\n");
        let (r, _) = resolver(generator, ScriptedIndex::default());
        let brand = r.extract_brand("발렌시아가와 비슷한 브랜드의 가방").await.unwrap();
        assert_eq!(brand.as_deref(), Some("발렌시아가"));
    }

    #[tokio::test]
    async fn test_extract_brand_empty_reply_is_none() {
        let (r, _) = resolver(FixedGenerator::replying("   "), ScriptedIndex::default());
        assert_eq!(r.extract_brand("similar to nothing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_extract_brand_provider_failure_is_error() {
        let (r, _) = resolver(FixedGenerator::failing(), ScriptedIndex::default());
        assert!(r.extract_brand("구찌와 같은 스타일의 지갑").await.is_err());
    }

    #[tokio::test]
    async fn test_extract_brand_prompt_carries_query() {
        let generator = Arc::new(FixedGenerator::replying("구찌"));
        let lookup = BrandLookup::new(
            Arc::new(EchoEmbedder { fail: false }),
            Arc::new(ScriptedIndex::default()),
            CallLimits::default(),
        );
        let r = BrandResolver::new(
            lookup,
            generator.clone(),
            &RankingConfig::default(),
            CallLimits::default(),
        );
        r.extract_brand("구찌와 같은 스타일의 지갑").await.unwrap();

        let calls = generator.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls[0][0].content.contains("검색어: 구찌와 같은 스타일의 지갑"));
    }

    #[tokio::test]
    async fn test_similar_brands_competitors_then_category() {
        let brands = ScriptedIndex::default()
            .answer(
                "Balenciaga 브랜드",
                vec![hit("b0", 0.9, json!({
                    "brand_name_en": "Balenciaga",
                    "competing_brands": "Gucci, Balenciaga, Prada",
                    "main_category": "패션",
                    "sub_category": "가방",
                    "price_range": "럭셔리",
                }))],
            )
            .answer(
                "패션 가방 럭셔리",
                vec![
                    hit("b0", 0.95, json!({"brand_name_en": "Balenciaga"})),
                    hit("b1", 0.9, json!({"brand_name_en": "Prada"})),
                    hit("b2", 0.8, json!({"brand_name_en": "Celine"})),
                    hit("b3", 0.7, json!({"brand_name_en": "Loewe"})),
                ],
            );
        let (r, index) = resolver(FixedGenerator::failing(), brands);

        let similar = r.similar_brands("Balenciaga", 3).await;
        assert_eq!(similar, vec!["Gucci", "Prada", "Celine"]);

        let calls = index.queried();
        assert_eq!(calls[0], ("Balenciaga 브랜드".to_string(), 1));
        assert_eq!(calls[1], ("패션 가방 럭셔리".to_string(), 5));
    }

    #[tokio::test]
    async fn test_similar_brands_unknown_sentinel_uses_category_only() {
        let brands = ScriptedIndex::default()
            .answer(
                "Acme 브랜드",
                vec![hit("a", 0.9, json!({
                    "brand_name_en": "Acme",
                    "competing_brands": "Unknown",
                    "main_category": "스포츠",
                    "sub_category": "신발",
                    "price_range": "중가",
                }))],
            )
            .answer(
                "스포츠 신발 중가",
                vec![
                    hit("a", 0.9, json!({"brand_name_en": "Acme"})),
                    hit("n", 0.8, json!({"brand_name_en": "Nike"})),
                    hit("x", 0.7, json!({"brand_name_ko": "이름없음"})),
                ],
            );
        let (r, _) = resolver(FixedGenerator::failing(), brands);
        assert_eq!(r.similar_brands("Acme", 3).await, vec!["Nike"]);
    }

    #[tokio::test]
    async fn test_similar_brands_excludes_record_names_of_extracted_brand() {
        let brands = ScriptedIndex::default()
            .answer(
                "발렌시아가 브랜드",
                vec![hit(
                    "b0",
                    0.9,
                    json!({
                        "brand_name_en": "Balenciaga",
                        "brand_name_ko": "발렌시아가",
                        "competing_brands": "Unknown",
                        "main_category": "패션",
                        "sub_category": "가방",
                        "price_range": "럭셔리",
                    }),
                )],
            )
            .answer(
                "패션 가방 럭셔리",
                vec![
                    hit("b0", 0.95, json!({"brand_name_en": "Balenciaga"})),
                    hit("b1", 0.9, json!({"brand_name_en": "Prada"})),
                ],
            );
        let (r, _) = resolver(FixedGenerator::failing(), brands);
        assert_eq!(r.similar_brands("발렌시아가", 3).await, vec!["Prada"]);
    }

    #[tokio::test]
    async fn test_similar_brands_no_record_is_empty() {
        let (r, index) = resolver(FixedGenerator::failing(), ScriptedIndex::default());
        assert!(r.similar_brands("Nowhere", 3).await.is_empty());
        assert_eq!(index.queried().len(), 1);
    }

    #[tokio::test]
    async fn test_similar_brands_lookup_failure_is_empty() {
        let brands = ScriptedIndex::default().fail_on("Gucci 브랜드");
        let (r, _) = resolver(FixedGenerator::failing(), brands);
        assert!(r.similar_brands("Gucci", 3).await.is_empty());
    }

    #[tokio::test]
    async fn test_similar_brands_category_failure_keeps_competitors() {
        let brands = ScriptedIndex::default()
            .answer(
                "Gucci 브랜드",
                vec![hit("g", 0.9, json!({
                    "brand_name_en": "Gucci",
                    "competing_brands": "Prada",
                    "main_category": "패션",
                    "sub_category": "지갑",
                    "price_range": "럭셔리",
                }))],
            )
            .fail_on("패션 지갑 럭셔리");
        let (r, _) = resolver(FixedGenerator::failing(), brands);
        assert_eq!(r.similar_brands("Gucci", 3).await, vec!["Prada"]);
    }

    #[tokio::test]
    async fn test_similar_brands_respects_k_and_dedups() {
        let brands = ScriptedIndex::default().answer(
            "Gucci 브랜드",
            vec![hit("g", 0.9, json!({
                "brand_name_en": "Gucci",
                "competing_brands": "Prada, Prada, Celine, Loewe, Dior",
            }))],
        );
        let (r, _) = resolver(FixedGenerator::failing(), brands);

        let similar = r.similar_brands("Gucci", 2).await;
        assert_eq!(similar, vec!["Prada", "Celine"]);
        assert!(r.similar_brands("Gucci", 0).await.is_empty());
    }
}
