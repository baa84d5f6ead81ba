use crate::config::KeywordWeights;
use crate::models::{metadata_str, Metadata};

/// The product text fields the keyword scorer looks at.
#[derive(Debug, Clone, Default)]
pub struct ProductFields {
    pub name: String,
    pub brand: String,
    pub description: String,
}

impl ProductFields {
    /// Read `product_name`, `brand` and `description`; missing fields are empty.
    pub fn from_metadata(metadata: &Metadata) -> Self {
        Self {
            name: metadata_str(metadata, "product_name").unwrap_or_default(),
            brand: metadata_str(metadata, "brand").unwrap_or_default(),
            description: metadata_str(metadata, "description").unwrap_or_default(),
        }
    }
}

/// Substring keyword-overlap scorer.
///
/// Each whitespace-separated query token earns the field weight for every
/// field it appears in, case-insensitively. No stemming; repeated tokens
/// count once per occurrence in the query.
#[derive(Debug, Clone, Copy)]
pub struct KeywordScorer {
    weights: KeywordWeights,
}

impl KeywordScorer {
    pub fn new(weights: KeywordWeights) -> Self {
        Self { weights }
    }

    pub fn score(&self, query: &str, fields: &ProductFields) -> f32 {
        let name = fields.name.to_lowercase();
        let brand = fields.brand.to_lowercase();
        let description = fields.description.to_lowercase();

        query
            .to_lowercase()
            .split_whitespace()
            .map(|token| {
                let mut score = 0.0;
                if name.contains(token) {
                    score += self.weights.name;
                }
                if brand.contains(token) {
                    score += self.weights.brand;
                }
                if description.contains(token) {
                    score += self.weights.description;
                }
                score
            })
            .sum()
    }
}

impl Default for KeywordScorer {
    fn default() -> Self {
        Self::new(KeywordWeights::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(name: &str, brand: &str, description: &str) -> ProductFields {
        ProductFields {
            name: name.to_string(),
            brand: brand.to_string(),
            description: description.to_string(),
        }
    }

    #[test]
    fn test_field_weights() {
        let scorer = KeywordScorer::default();
        let f = fields("가죽 토트백", "Gucci", "이탈리아산 소가죽");
        assert_eq!(scorer.score("토트백", &f), 5.0);
        assert_eq!(scorer.score("gucci", &f), 3.0);
        assert_eq!(scorer.score("이탈리아산", &f), 1.0);
        // "가죽" is a substring of both the name and the description
        assert_eq!(scorer.score("가죽", &f), 6.0);
    }

    #[test]
    fn test_case_folding_both_sides() {
        let scorer = KeywordScorer::default();
        let f = fields("Leather Tote", "GUCCI", "");
        assert_eq!(scorer.score("LEATHER gucci", &f), 8.0);
    }

    #[test]
    fn test_no_match_is_zero() {
        let scorer = KeywordScorer::default();
        assert_eq!(scorer.score("운동화", &fields("가죽 가방", "Prada", "숄더백")), 0.0);
        assert_eq!(scorer.score("", &fields("가죽 가방", "Prada", "숄더백")), 0.0);
    }

    #[test]
    fn test_missing_fields_contribute_nothing() {
        let scorer = KeywordScorer::default();
        let metadata = serde_json::json!({"product_name": "가죽 가방"});
        let f = ProductFields::from_metadata(metadata.as_object().unwrap());
        assert_eq!(f.brand, "");
        assert_eq!(scorer.score("가방 prada", &f), 5.0);
    }

    #[test]
    fn test_repeated_tokens_count_each_time() {
        let scorer = KeywordScorer::default();
        let f = fields("가방", "", "");
        assert_eq!(scorer.score("가방 가방", &f), 10.0);
    }

    #[test]
    fn test_custom_weights() {
        let scorer = KeywordScorer::new(KeywordWeights {
            name: 2.0,
            brand: 0.0,
            description: 0.5,
        });
        let f = fields("tote", "tote", "tote");
        assert_eq!(scorer.score("tote", &f), 2.5);
    }
}
