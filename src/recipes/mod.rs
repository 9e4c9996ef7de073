pub mod handlers;
pub mod repo;

use axum::Router;

use crate::state::AppState;

pub use repo::{PgRecipeRepo, RecipeRepo};

pub fn router() -> Router<AppState> {
    handlers::routes()
}
