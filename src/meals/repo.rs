use anyhow::Context;
use axum::async_trait;
use sqlx::{types::Json, FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::api::LogMealRequest;
use crate::domain::{Ingredient, LoggedMeal, Nutrition};

#[async_trait]
pub trait MealRepo: Send + Sync {
    async fn insert(&self, user_id: Uuid, meal: &LogMealRequest) -> anyhow::Result<Uuid>;
    /// Most recent first.
    async fn list_recent(&self, user_id: Uuid, limit: i64) -> anyhow::Result<Vec<LoggedMeal>>;
}

#[derive(Debug, FromRow)]
struct LoggedMealRow {
    id: Uuid,
    dish_name: String,
    ingredients: Json<Vec<Ingredient>>,
    nutrition: Option<Json<Nutrition>>,
    cuisine_type: Option<String>,
    source: String,
    confidence: Option<i16>,
    identified_at: OffsetDateTime,
}

impl TryFrom<LoggedMealRow> for LoggedMeal {
    type Error = anyhow::Error;

    fn try_from(r: LoggedMealRow) -> anyhow::Result<Self> {
        Ok(LoggedMeal {
            id: r.id,
            dish_name: r.dish_name,
            ingredients: r.ingredients.0,
            nutrition: r.nutrition.map(|n| n.0),
            cuisine_type: r.cuisine_type,
            source: r.source.parse()?,
            confidence: r.confidence.map(|c| c.clamp(0, 100) as u8),
            identified_at: r.identified_at,
        })
    }
}

pub struct PgMealRepo {
    db: PgPool,
}

impl PgMealRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MealRepo for PgMealRepo {
    async fn insert(&self, user_id: Uuid, meal: &LogMealRequest) -> anyhow::Result<Uuid> {
        let id: (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO logged_meals
                (user_id, dish_name, ingredients, nutrition, cuisine_type, source, confidence)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(&meal.dish_name)
        .bind(Json(&meal.ingredients))
        .bind(Json(&meal.nutrition))
        .bind(&meal.cuisine_type)
        .bind(meal.source.as_str())
        .bind(meal.confidence.map(i16::from))
        .fetch_one(&self.db)
        .await
        .context("insert logged meal")?;
        Ok(id.0)
    }

    async fn list_recent(&self, user_id: Uuid, limit: i64) -> anyhow::Result<Vec<LoggedMeal>> {
        let rows = sqlx::query_as::<_, LoggedMealRow>(
            r#"
            SELECT id, dish_name, ingredients, nutrition, cuisine_type, source,
                   confidence, identified_at
            FROM logged_meals
            WHERE user_id = $1
            ORDER BY identified_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.db)
        .await
        .context("list logged meals")?;
        rows.into_iter().map(LoggedMeal::try_from).collect()
    }
}
