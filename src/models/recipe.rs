//! Persisted recipe aggregate: recipe, steps, and resolved ingredients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A committed recipe row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub source_url: Option<String>,
    pub servings: Option<i32>,
    pub prep_minutes: Option<i32>,
    pub cook_minutes: Option<i32>,
    /// Tag order is preserved for display; querying treats tags as a set.
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single instruction within a recipe.
///
/// Step numbers are 1-based and contiguous per recipe, assigned from the
/// position of the instruction in the submitted sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeStep {
    pub recipe_id: Uuid,
    pub step_number: i32,
    pub instruction: String,
}

/// An ingredient line with its canonical dictionary identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub recipe_id: Uuid,
    pub ingredient_id: Uuid,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub is_optional: bool,
    pub preparation_notes: Option<String>,
}

/// A recipe with its child rows, as returned by the detail endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct RecipeDetail {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub steps: Vec<RecipeStep>,
    pub ingredients: Vec<RecipeIngredient>,
}
