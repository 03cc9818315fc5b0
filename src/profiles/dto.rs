use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Stored dietary preferences. Hashable so a personalized request built from
/// them can serve as a cache key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserPreferences {
    #[serde(default)]
    pub dietary_restrictions: Vec<String>,
    #[serde(default)]
    pub health_goals: Vec<String>,
    #[serde(default)]
    pub activity_level: String,
    #[serde(default)]
    pub preferred_cuisines: Vec<String>,
    #[serde(default)]
    pub disliked_ingredients: Vec<String>,
}

/// User-defined grouping for saved diets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DietCategory {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedDiet {
    pub diet_id: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub saved_at: OffsetDateTime,
}

/// Profile document as stored, keyed by email.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub preferences: UserPreferences,
    #[serde(default)]
    pub categories: Vec<DietCategory>,
    #[serde(default)]
    pub saved_diets: Vec<SavedDiet>,
}

impl UserProfile {
    pub fn saved_diet_ids(&self) -> Vec<String> {
        self.saved_diets.iter().map(|s| s.diet_id.clone()).collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct SaveDietRequest {
    pub diet_id: String,
    #[serde(default)]
    pub category: Option<String>,
}
