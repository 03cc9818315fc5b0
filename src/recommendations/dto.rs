use serde::{Deserialize, Serialize};

use crate::profiles::dto::UserPreferences;
use crate::recipes::mapping::PLACEHOLDER_IMAGE;
use crate::recipes::types::{Diet, NutritionalFacts};

/// Caller identity used for view tracking when no token is presented.
pub const ANONYMOUS_USER: &str = "guest";

/// Record returned by the recommendation engine. Carries at minimum the
/// catalog id; everything else is optional metadata the engine may attach.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRecord {
    pub id: i64,
    #[serde(default)]
    pub recipe: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
}

impl RecommendationRecord {
    /// Degraded mapping used when catalog enrichment is unavailable: only the
    /// fields the engine itself returned.
    pub fn to_diet_unenriched(&self) -> Diet {
        let name = self
            .recipe
            .clone()
            .unwrap_or_else(|| "Keto Recipe".to_string());
        Diet {
            id: self.id.to_string(),
            name: name.clone(),
            description: format!("{name}, a keto-friendly recipe."),
            image_url: self
                .image
                .clone()
                .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
            tags: vec!["keto".to_string()],
            nutritional_facts: NutritionalFacts::default(),
            benefits: Vec::new(),
            sample_meals: vec![name],
            recipe: None,
        }
    }
}

/// Request body for the personalized endpoint. Field order is fixed by the
/// struct, so structurally equal requests always derive the same cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PersonalizedRequest {
    pub user_id: String,
    pub preferences: UserPreferences,
    pub liked_recipes: Vec<String>,
    pub num_recommendations: usize,
}

#[derive(Debug, Deserialize)]
pub struct SimilarQuery {
    #[serde(default = "default_similar_count")]
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct PopularQuery {
    #[serde(default = "default_popular_count")]
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct TrackViewRequest {
    pub diet_id: String,
}

/// Admin-facing selector for single-entry cache eviction. Personalized
/// entries age out via the TTL; there is no stable external handle for them.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CacheKeySpec {
    Similar { diet_id: String, count: usize },
    Popular { count: usize },
}

impl CacheKeySpec {
    pub fn into_key(self) -> crate::cache::CacheKey {
        match self {
            CacheKeySpec::Similar { diet_id, count } => {
                crate::cache::CacheKey::Similar { diet_id, count }
            }
            CacheKeySpec::Popular { count } => crate::cache::CacheKey::Popular { count },
        }
    }
}

pub fn default_similar_count() -> usize {
    4
}

pub fn default_popular_count() -> usize {
    8
}
