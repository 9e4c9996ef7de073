use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::meal::{Difficulty, Ingredient, Nutrition};

pub const DEFAULT_SERVINGS: u32 = 2;
pub const DEFAULT_RECIPE_SOURCE: &str = "ai_generated";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructionStep {
    /// 1-based position.
    pub step: u32,
    pub description: String,
    /// Minutes.
    #[serde(default)]
    pub duration: u32,
}

/// A recipe with every field populated; built by `normalize::recipe_from_value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedRecipe {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub source: String,
    pub ingredients: Vec<Ingredient>,
    pub instructions: Vec<InstructionStep>,
    pub nutrition: Nutrition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prep_time: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cook_time: Option<u32>,
    pub servings: u32,
    pub difficulty: Difficulty,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cuisine_type: Option<String>,
}

impl GeneratedRecipe {
    /// Prep plus cook time, if either is known.
    pub fn total_time(&self) -> Option<u32> {
        match (self.prep_time, self.cook_time) {
            (None, None) => None,
            (p, c) => Some(p.unwrap_or(0) + c.unwrap_or(0)),
        }
    }
}

/// A persisted recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRecipe {
    pub id: Uuid,
    #[serde(flatten)]
    pub recipe: GeneratedRecipe,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// User annotation on a stored recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedRecipe {
    pub id: Uuid,
    pub recipe_id: Uuid,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

/// One row of the saved list. `recipe` may be missing if it was removed upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedRecipeEntry {
    pub recipe: Option<StoredRecipe>,
    pub saved_recipe: SavedRecipe,
}
