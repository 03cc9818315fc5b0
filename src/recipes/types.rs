use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Application-facing diet record, derived from a catalog record at read time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diet {
    pub id: String,
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub tags: Vec<String>,
    pub nutritional_facts: NutritionalFacts,
    pub benefits: Vec<String>,
    pub sample_meals: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipe: Option<Recipe>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionalFacts {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub ingredients: Vec<String>,
    pub directions: Vec<String>,
    pub servings: u32,
    pub prep_time: u32,
    pub cook_time: u32,
    pub difficulty: String,
}

/// Catalog record as the external recipe API returns it. Every field is
/// optional; the numbered ingredient/measurement/direction slots
/// (`ingredient_1..10` etc.) land in `slots` via `#[serde(flatten)]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRecipeRecord {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub recipe: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<RawCategory>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub calories: Option<f64>,
    #[serde(default)]
    pub protein_in_grams: Option<f64>,
    #[serde(default)]
    pub carbohydrates_in_grams: Option<f64>,
    #[serde(default)]
    pub fat_in_grams: Option<f64>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub prep_time_in_minutes: Option<f64>,
    #[serde(default)]
    pub cook_time_in_minutes: Option<f64>,
    #[serde(default)]
    pub serving: Option<f64>,
    #[serde(flatten)]
    pub slots: BTreeMap<String, serde_json::Value>,
}

impl RawRecipeRecord {
    /// Stringified catalog id, the identity `Diet` inherits.
    pub fn id_str(&self) -> String {
        self.id.map(|id| id.to_string()).unwrap_or_default()
    }

    /// Reads a numbered slot (e.g. `ingredient_3`) as non-empty text.
    pub fn slot_text(&self, prefix: &str, index: usize) -> Option<&str> {
        self.slots
            .get(&format!("{prefix}_{index}"))
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCategory {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

/// Numeric range filters for catalog search, passed through to the API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogFilter {
    pub min_protein: Option<f64>,
    pub max_protein: Option<f64>,
    pub min_carbs: Option<f64>,
    pub max_carbs: Option<f64>,
    pub min_calories: Option<f64>,
    pub max_calories: Option<f64>,
}
