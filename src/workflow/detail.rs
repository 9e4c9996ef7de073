use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::{error, info, instrument};
use uuid::Uuid;

use super::guard::InFlight;
use crate::api::MealApi;
use crate::domain::GeneratedRecipe;
use crate::error::{CompanionError, Operation};
use crate::normalize;
use crate::shopping::ShoppingList;

/// Recipe screen state. Owns its recipe by value.
pub struct RecipeDetail {
    api: Arc<dyn MealApi>,
    recipe: GeneratedRecipe,
    draft_id: Uuid,
    saving: InFlight<Uuid>,
    saved: Mutex<Option<Uuid>>,
}

impl fmt::Debug for RecipeDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecipeDetail")
            .field("recipe", &self.recipe.name)
            .field("draft_id", &self.draft_id)
            .field("saved", &self.saved_id())
            .finish_non_exhaustive()
    }
}

impl RecipeDetail {
    pub fn new(api: Arc<dyn MealApi>, recipe: GeneratedRecipe) -> Self {
        Self {
            api,
            recipe,
            draft_id: Uuid::new_v4(),
            saving: InFlight::new(),
            saved: Mutex::new(None),
        }
    }

    /// Opens a recipe handed over as serialized JSON.
    pub fn from_navigation_payload(
        api: Arc<dyn MealApi>,
        payload: &str,
    ) -> Result<Self, CompanionError> {
        let recipe = normalize::recipe_from_json(payload).map_err(|e| {
            error!(error = %e, "failed to parse recipe data");
            e
        })?;
        Ok(Self::new(api, recipe))
    }

    pub fn to_navigation_payload(&self) -> Result<String, CompanionError> {
        serde_json::to_string(&self.recipe).map_err(|e| CompanionError::malformed(e.to_string()))
    }

    pub fn recipe(&self) -> &GeneratedRecipe {
        &self.recipe
    }

    pub fn saved_id(&self) -> Option<Uuid> {
        *self.saved.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn is_saved(&self) -> bool {
        self.saved_id().is_some()
    }

    pub fn is_saving(&self) -> bool {
        self.saving.is_active(&self.draft_id)
    }

    pub fn shopping_list(&self) -> ShoppingList {
        ShoppingList::from_ingredients(&self.recipe.ingredients)
    }

    /// Saves the recipe to the user's collection exactly once.
    #[instrument(skip(self), fields(name = %self.recipe.name))]
    pub async fn save(&self) -> Result<Uuid, CompanionError> {
        let _token = self
            .saving
            .try_acquire(self.draft_id)
            .ok_or(CompanionError::InFlight(Operation::Save))?;
        if self.is_saved() {
            return Err(CompanionError::InvalidTransition {
                action: "save",
                state: "saved",
            });
        }

        match self.api.create_recipe(self.recipe.clone()).await {
            Ok(created) => {
                *self.saved.lock().unwrap_or_else(|p| p.into_inner()) = Some(created.id);
                info!(id = %created.id, "recipe saved to collection");
                Ok(created.id)
            }
            Err(e) => {
                error!(error = %e, "failed to save recipe");
                Err(CompanionError::remote(Operation::Save, e))
            }
        }
    }
}
