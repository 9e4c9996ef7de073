use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::{error, info, instrument, warn};

use crate::{
    api::{Created, LogMealRequest, DEFAULT_HISTORY_LIMIT},
    app::internal,
    auth::AuthUser,
    domain::LoggedMeal,
    state::AppState,
};

pub const MAX_HISTORY_LIMIT: u32 = 500;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/meals", post(log_meal))
        .route("/meals/history", get(history))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<u32>,
}

fn validate(req: &LogMealRequest) -> Result<(), &'static str> {
    if req.dish_name.trim().is_empty() {
        return Err("dishName is required");
    }
    if req.confidence.is_some_and(|c| c > 100) {
        return Err("confidence must be within 0..=100");
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

#[instrument(skip(state, req), fields(dish = %req.dish_name))]
pub async fn log_meal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<LogMealRequest>,
) -> Result<(StatusCode, Json<Created>), (StatusCode, String)> {
    if let Err(msg) = validate(&req) {
        warn!(%user_id, msg, "rejected meal log");
        return Err((StatusCode::BAD_REQUEST, msg.into()));
    }
    let id = state.meals.insert(user_id, &req).await.map_err(|e| {
        error!(error = %e, %user_id, "log meal failed");
        internal(e)
    })?;
    info!(%user_id, meal_id = %id, "meal logged");
    Ok((StatusCode::CREATED, Json(Created { id })))
}

#[instrument(skip(state))]
pub async fn history(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<HistoryQuery>,
) -> Result<Json<Vec<LoggedMeal>>, (StatusCode, String)> {
    let limit = q
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);
    let meals = state
        .meals
        .list_recent(user_id, i64::from(limit))
        .await
        .map_err(|e| {
            error!(error = %e, %user_id, "load history failed");
            internal(e)
        })?;
    Ok(Json(meals))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::tacos;
    use uuid::Uuid;

    #[tokio::test]
    async fn logged_meal_shows_up_in_history() {
        let state = AppState::fake();
        let user = Uuid::new_v4();
        let req = LogMealRequest::from_identified(&tacos());

        let (status, Json(created)) = log_meal(State(state.clone()), AuthUser(user), Json(req))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);

        let Json(meals) = history(
            State(state.clone()),
            AuthUser(user),
            Query(HistoryQuery { limit: None }),
        )
        .await
        .unwrap();
        assert_eq!(meals.len(), 1);
        assert_eq!(meals[0].id, created.id);
        assert_eq!(meals[0].confidence, Some(60));
        assert_eq!(meals[0].nutrition.unwrap().protein, 10.0);

        let Json(other) = history(
            State(state),
            AuthUser(Uuid::new_v4()),
            Query(HistoryQuery { limit: None }),
        )
        .await
        .unwrap();
        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn history_is_newest_first_and_clamped() {
        let state = AppState::fake();
        let user = Uuid::new_v4();
        for name in ["Oats", "Salad", "Curry"] {
            let mut req = LogMealRequest::from_identified(&tacos());
            req.dish_name = name.into();
            log_meal(State(state.clone()), AuthUser(user), Json(req))
                .await
                .unwrap();
        }
        let Json(meals) = history(
            State(state.clone()),
            AuthUser(user),
            Query(HistoryQuery { limit: Some(2) }),
        )
        .await
        .unwrap();
        let names: Vec<_> = meals.iter().map(|m| m.dish_name.as_str()).collect();
        assert_eq!(names, vec!["Curry", "Salad"]);

        let Json(meals) = history(
            State(state),
            AuthUser(user),
            Query(HistoryQuery { limit: Some(0) }),
        )
        .await
        .unwrap();
        assert_eq!(meals.len(), 1);
    }

    #[tokio::test]
    async fn invalid_meal_is_rejected() {
        let state = AppState::fake();
        let mut req = LogMealRequest::from_identified(&tacos());
        req.nutrition.fat = -1.0;
        let err = log_meal(State(state.clone()), AuthUser(Uuid::new_v4()), Json(req))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);

        let mut req = LogMealRequest::from_identified(&tacos());
        req.dish_name = "  ".into();
        let err = log_meal(State(state), AuthUser(Uuid::new_v4()), Json(req))
            .await
            .unwrap_err();
        assert_eq!(err.1, "dishName is required");
    }
}
