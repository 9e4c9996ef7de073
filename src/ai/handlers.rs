use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    api::{ChatRequest, ChatResponse, GenerateRecipeRequest, IdentifyMealRequest},
    auth::AuthUser,
    domain::{GeneratedRecipe, IdentifiedMeal},
    images,
    normalize::{identified_meal_from_value, recipe_from_value},
    state::AppState,
};

pub const MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ai/identify", post(identify))
        .route("/ai/recipe", post(generate_recipe))
        .route("/ai/chat", post(chat))
        .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES))
}

fn upstream(e: impl std::fmt::Display) -> (StatusCode, String) {
    (StatusCode::BAD_GATEWAY, e.to_string())
}

/// Stages an inline photo, runs the analyzer on its URL, then removes it.
async fn analyze_inline(
    state: &AppState,
    user_id: Uuid,
    b64: &str,
    content_type: &str,
) -> Result<serde_json::Value, (StatusCode, String)> {
    let body = images::decode_inline(b64).map_err(|e| {
        warn!(error = %e, %user_id, "bad inline image");
        (StatusCode::BAD_REQUEST, e.to_string())
    })?;
    let staged = images::stage(state.storage.as_ref(), user_id, body, content_type)
        .await
        .map_err(|e| {
            error!(error = %e, %user_id, "staging image failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;
    let result = state.analyzer.identify(&staged.url).await;
    images::discard(state.storage.as_ref(), &staged.key).await;
    result.map_err(|e| {
        error!(error = %e, %user_id, "analyzer identify failed");
        upstream(e)
    })
}

#[instrument(skip(state, req))]
pub async fn identify(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<IdentifyMealRequest>,
) -> Result<Json<IdentifiedMeal>, (StatusCode, String)> {
    let raw = match (req.image_url.as_deref(), req.image_b64.as_deref()) {
        (Some(url), _) => state.analyzer.identify(url).await.map_err(|e| {
            error!(error = %e, %user_id, "analyzer identify failed");
            upstream(e)
        })?,
        (None, Some(b64)) => {
            let ct = req.content_type.as_deref().unwrap_or("image/jpeg");
            analyze_inline(&state, user_id, b64, ct).await?
        }
        (None, None) => {
            return Err((
                StatusCode::BAD_REQUEST,
                "imageUrl or imageB64 is required".into(),
            ))
        }
    };

    let meal = identified_meal_from_value(&raw).map_err(|e| {
        warn!(error = %e, %user_id, "unusable identification");
        upstream(e)
    })?;
    info!(%user_id, dish = %meal.dish_name, confidence = %meal.confidence, "meal identified");
    Ok(Json(meal))
}

#[instrument(skip(state, req), fields(ingredients = req.ingredients.len()))]
pub async fn generate_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<GenerateRecipeRequest>,
) -> Result<Json<GeneratedRecipe>, (StatusCode, String)> {
    if req.ingredients.iter().all(|i| i.trim().is_empty()) {
        return Err((StatusCode::BAD_REQUEST, "ingredients are required".into()));
    }
    let raw = state.analyzer.recipe(&req).await.map_err(|e| {
        error!(error = %e, %user_id, "analyzer recipe failed");
        upstream(e)
    })?;
    let recipe = recipe_from_value(&raw).map_err(|e| {
        warn!(error = %e, %user_id, "unusable recipe");
        upstream(e)
    })?;
    Ok(Json(recipe))
}

#[instrument(skip(state, req), fields(turns = req.messages.len()))]
pub async fn chat(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, String)> {
    if req.messages.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "messages are required".into()));
    }
    let response = state.analyzer.chat(&req).await.map_err(|e| {
        error!(error = %e, %user_id, "analyzer chat failed");
        upstream(e)
    })?;
    Ok(Json(ChatResponse { response }))
}
