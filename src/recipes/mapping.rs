//! Pure translation from external catalog records into the `Diet` domain
//! shape: tag derivation from nutritional thresholds and extraction of the
//! numbered ingredient/measurement/direction slots.

use super::types::{Diet, NutritionalFacts, RawRecipeRecord, Recipe};

pub const PLACEHOLDER_IMAGE: &str =
    "https://images.unsplash.com/photo-1490645935967-10de6ba17061?w=800";

const SLOT_COUNT: usize = 10;

/// Maps a catalog record into a `Diet`. Total: every missing numeric field
/// defaults to 0 and every missing string field gets a safe placeholder.
pub fn to_diet(raw: &RawRecipeRecord) -> Diet {
    let name = raw
        .recipe
        .clone()
        .unwrap_or_else(|| "Keto Recipe".to_string());
    let description = raw.description.clone().unwrap_or_else(|| {
        match raw.category.as_ref().and_then(|c| c.category.as_deref()) {
            Some(category) => {
                format!("{name}, a keto-friendly {} recipe.", category.to_lowercase())
            }
            None => format!("{name}, a keto-friendly recipe."),
        }
    });
    let image_url = raw
        .image
        .clone()
        .or_else(|| raw.category.as_ref().and_then(|c| c.thumbnail.clone()))
        .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string());

    Diet {
        id: raw.id_str(),
        name: name.clone(),
        description,
        image_url,
        tags: derive_tags(raw),
        nutritional_facts: NutritionalFacts {
            calories: raw.calories.unwrap_or(0.0),
            protein: raw.protein_in_grams.unwrap_or(0.0),
            carbs: raw.carbohydrates_in_grams.unwrap_or(0.0),
            fat: raw.fat_in_grams.unwrap_or(0.0),
        },
        benefits: standard_benefits(),
        sample_meals: vec![name],
        recipe: Some(Recipe {
            ingredients: extract_ingredients(raw),
            directions: extract_directions(raw),
            servings: raw.serving.unwrap_or(0.0).max(0.0) as u32,
            prep_time: raw.prep_time_in_minutes.unwrap_or(0.0).max(0.0) as u32,
            cook_time: raw.cook_time_in_minutes.unwrap_or(0.0).max(0.0) as u32,
            difficulty: raw.difficulty.clone().unwrap_or_else(|| "Unknown".to_string()),
        }),
    }
}

/// Derives content tags from nutritional thresholds. All thresholds are
/// exclusive and fixed.
pub fn derive_tags(raw: &RawRecipeRecord) -> Vec<String> {
    let mut tags = vec!["keto".to_string()];

    if let Some(category) = raw.category.as_ref().and_then(|c| c.category.as_deref()) {
        let slug = slugify(category);
        if !slug.is_empty() {
            tags.push(slug);
        }
    }

    if let Some(protein) = raw.protein_in_grams {
        if protein > 20.0 {
            tags.push("high-protein".to_string());
        } else if protein < 10.0 {
            tags.push("low-protein".to_string());
        }
    }
    if let Some(fat) = raw.fat_in_grams {
        if fat > 30.0 {
            tags.push("high-fat".to_string());
        }
    }
    if let Some(carbs) = raw.carbohydrates_in_grams {
        if carbs < 10.0 {
            tags.push("very-low-carb".to_string());
        } else if carbs < 20.0 {
            tags.push("low-carb".to_string());
        }
    }
    if let Some(calories) = raw.calories {
        if calories < 300.0 {
            tags.push("low-calorie".to_string());
        } else if calories > 500.0 {
            tags.push("high-calorie".to_string());
        }
    }
    if let Some(difficulty) = raw.difficulty.as_deref() {
        let label = difficulty.trim().to_lowercase();
        if !label.is_empty() {
            tags.push(label);
        }
    }

    tags
}

/// Ingredient lines from the ten numbered slots, in slot order. A line
/// combines the measurement with the ingredient name when both are present.
pub fn extract_ingredients(raw: &RawRecipeRecord) -> Vec<String> {
    (1..=SLOT_COUNT)
        .filter_map(|i| {
            let ingredient = raw.slot_text("ingredient", i)?;
            Some(match raw.slot_text("measurement", i) {
                Some(measurement) => format!("{measurement} {ingredient}"),
                None => ingredient.to_string(),
            })
        })
        .collect()
}

pub fn extract_directions(raw: &RawRecipeRecord) -> Vec<String> {
    (1..=SLOT_COUNT)
        .filter_map(|i| raw.slot_text("directions_step", i).map(str::to_string))
        .collect()
}

fn slugify(label: &str) -> String {
    label
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

fn standard_benefits() -> Vec<String> {
    vec![
        "Supports ketosis".to_string(),
        "Steady energy levels".to_string(),
        "Reduced sugar intake".to_string(),
    ]
}
