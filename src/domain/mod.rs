mod chat;
mod image;
mod meal;
mod recipe;

pub use chat::{ChatContext, ChatMessage, ChatRole, WireMessage, WireRole};
pub use image::ImageReference;
pub use meal::{
    Confidence, Difficulty, IdentifiedMeal, Ingredient, LoggedMeal, Macros, MealSource, Nutrition,
};
pub use recipe::{
    GeneratedRecipe, InstructionStep, SavedRecipe, SavedRecipeEntry, StoredRecipe,
    DEFAULT_RECIPE_SOURCE, DEFAULT_SERVINGS,
};
