//! The remote procedure contract between the companion client and the backend.

pub mod http;

use axum::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::{
    ChatContext, GeneratedRecipe, IdentifiedMeal, ImageReference, Ingredient, LoggedMeal,
    MealSource, Nutrition, SavedRecipe, SavedRecipeEntry, WireMessage,
};

pub use http::HttpMealApi;

/// Body of `POST /ai/identify`. Exactly one of `image_url` / `image_b64` is set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyMealRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_b64: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipePreferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cuisine_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servings: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRecipeRequest {
    /// Names only, in identification order.
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub preferences: RecipePreferences,
}

/// Recipe as returned by generation, before defaults are applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecipe(pub Value);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<WireMessage>,
    #[serde(default)]
    pub context: ChatContext,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

/// A meal-log candidate. Nutrition is always populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogMealRequest {
    pub dish_name: String,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    pub nutrition: Nutrition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cuisine_type: Option<String>,
    pub source: MealSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<u8>,
}

impl LogMealRequest {
    pub fn from_identified(meal: &IdentifiedMeal) -> Self {
        Self {
            dish_name: meal.dish_name.clone(),
            ingredients: meal.ingredients.clone(),
            nutrition: meal.nutrition(),
            cuisine_type: meal.cuisine_type.clone(),
            source: MealSource::Camera,
            confidence: Some(meal.confidence.to_percent()),
        }
    }
}

/// A recipe-save candidate; already normalized.
pub type CreateRecipeRequest = GeneratedRecipe;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Created {
    pub id: Uuid,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedRecipeUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
    /// An empty string clears the note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

pub const DEFAULT_HISTORY_LIMIT: u32 = 100;

#[async_trait]
pub trait MealApi: Send + Sync {
    async fn identify_meal(&self, image: ImageReference) -> anyhow::Result<IdentifiedMeal>;
    async fn generate_recipe(&self, req: GenerateRecipeRequest) -> anyhow::Result<RawRecipe>;
    async fn chat(&self, req: ChatRequest) -> anyhow::Result<ChatResponse>;
    async fn log_meal(&self, req: LogMealRequest) -> anyhow::Result<Created>;
    /// Most recent first.
    async fn get_history(&self, limit: u32) -> anyhow::Result<Vec<LoggedMeal>>;
    async fn create_recipe(&self, req: CreateRecipeRequest) -> anyhow::Result<Created>;
    async fn get_saved(&self) -> anyhow::Result<Vec<SavedRecipeEntry>>;
    async fn update_saved(&self, id: Uuid, update: SavedRecipeUpdate)
        -> anyhow::Result<SavedRecipe>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Confidence, Macros};

    #[test]
    fn log_request_from_identified_meal() {
        let meal = IdentifiedMeal {
            dish_name: "Tacos".into(),
            ingredients: vec![],
            calories: 300.0,
            macros: Macros {
                protein: 10.0,
                fat: 5.0,
                carbs: 20.0,
            },
            cuisine_type: Some("Mexican".into()),
            difficulty: None,
            confidence: Confidence::new(0.873),
        };
        let req = LogMealRequest::from_identified(&meal);
        assert_eq!(req.confidence, Some(87));
        assert_eq!(req.source, MealSource::Camera);
        assert_eq!(req.nutrition.calories, 300.0);
        assert_eq!(req.nutrition.fat, 5.0);

        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["dishName"], "Tacos");
        assert_eq!(json["source"], "camera");
    }
}
