use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    api::{CreateRecipeRequest, Created, SavedRecipeUpdate},
    app::internal,
    auth::AuthUser,
    domain::{SavedRecipe, SavedRecipeEntry},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", post(create_recipe))
        .route("/recipes/saved", get(list_saved))
        .route("/recipes/saved/:id", patch(update_saved))
}

fn validate(req: &CreateRecipeRequest) -> Result<(), &'static str> {
    if req.name.trim().is_empty() {
        return Err("name is required");
    }
    if req.servings == 0 {
        return Err("servings must be at least 1");
    }
    let fits = |v: u32| i32::try_from(v).is_ok();
    if !fits(req.servings) || !req.prep_time.into_iter().chain(req.cook_time).all(fits) {
        return Err("servings and times are out of range");
    }
    let n = &req.nutrition;
    if [n.calories, n.protein, n.carbs, n.fat]
        .iter()
        .any(|v| !v.is_finite() || *v < 0.0)
    {
        return Err("nutrition values must be non-negative");
    }
    Ok(())
}

#[instrument(skip(state, req), fields(name = %req.name))]
pub async fn create_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<CreateRecipeRequest>,
) -> Result<(StatusCode, Json<Created>), (StatusCode, String)> {
    if let Err(msg) = validate(&req) {
        warn!(%user_id, msg, "rejected recipe");
        return Err((StatusCode::BAD_REQUEST, msg.into()));
    }
    let id = state.recipes.create(user_id, &req).await.map_err(|e| {
        error!(error = %e, %user_id, "create recipe failed");
        internal(e)
    })?;
    info!(%user_id, recipe_id = %id, "recipe saved");
    Ok((StatusCode::CREATED, Json(Created { id })))
}

#[instrument(skip(state))]
pub async fn list_saved(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<SavedRecipeEntry>>, (StatusCode, String)> {
    state.recipes.list_saved(user_id).await.map(Json).map_err(|e| {
        error!(error = %e, %user_id, "list saved recipes failed");
        internal(e)
    })
}

#[instrument(skip(state, update))]
pub async fn update_saved(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(update): Json<SavedRecipeUpdate>,
) -> Result<Json<SavedRecipe>, (StatusCode, String)> {
    match state.recipes.update_saved(user_id, id, &update).await {
        Ok(Some(saved)) => Ok(Json(saved)),
        Ok(None) => Err((StatusCode::NOT_FOUND, "Saved recipe not found".into())),
        Err(e) => {
            error!(error = %e, %user_id, %id, "update saved recipe failed");
            Err(internal(e))
        }
    }
}
