use std::collections::HashMap;

use anyhow::Context;
use axum::async_trait;
use sqlx::{types::Json, FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::api::SavedRecipeUpdate;
use crate::domain::{
    GeneratedRecipe, Ingredient, InstructionStep, Nutrition, SavedRecipe, SavedRecipeEntry,
    StoredRecipe,
};

#[async_trait]
pub trait RecipeRepo: Send + Sync {
    /// Stores the recipe and its saved-list row together; returns the recipe id.
    async fn create(&self, user_id: Uuid, recipe: &GeneratedRecipe) -> anyhow::Result<Uuid>;
    async fn list_saved(&self, user_id: Uuid) -> anyhow::Result<Vec<SavedRecipeEntry>>;
    async fn update_saved(
        &self,
        user_id: Uuid,
        saved_id: Uuid,
        update: &SavedRecipeUpdate,
    ) -> anyhow::Result<Option<SavedRecipe>>;
}

#[derive(Debug, FromRow)]
struct RecipeRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    source: String,
    ingredients: Json<Vec<Ingredient>>,
    instructions: Json<Vec<InstructionStep>>,
    nutrition: Json<Nutrition>,
    prep_time: Option<i32>,
    cook_time: Option<i32>,
    servings: i32,
    difficulty: String,
    cuisine_type: Option<String>,
    created_at: OffsetDateTime,
}

impl TryFrom<RecipeRow> for StoredRecipe {
    type Error = anyhow::Error;

    fn try_from(r: RecipeRow) -> anyhow::Result<Self> {
        let minutes = |m: Option<i32>| m.map(|v| v.max(0) as u32);
        Ok(StoredRecipe {
            id: r.id,
            recipe: GeneratedRecipe {
                name: r.name,
                description: r.description,
                source: r.source,
                ingredients: r.ingredients.0,
                instructions: r.instructions.0,
                nutrition: r.nutrition.0,
                prep_time: minutes(r.prep_time),
                cook_time: minutes(r.cook_time),
                servings: r.servings.max(1) as u32,
                difficulty: r.difficulty.parse()?,
                cuisine_type: r.cuisine_type,
            },
            created_at: r.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct SavedRow {
    id: Uuid,
    recipe_id: Uuid,
    is_favorite: bool,
    notes: Option<String>,
}

impl From<SavedRow> for SavedRecipe {
    fn from(r: SavedRow) -> Self {
        SavedRecipe {
            id: r.id,
            recipe_id: r.recipe_id,
            is_favorite: r.is_favorite,
            notes: r.notes,
        }
    }
}

pub struct PgRecipeRepo {
    db: PgPool,
}

impl PgRecipeRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RecipeRepo for PgRecipeRepo {
    async fn create(&self, user_id: Uuid, recipe: &GeneratedRecipe) -> anyhow::Result<Uuid> {
        let minutes = |v: Option<u32>| v.map(i32::try_from).transpose().context("time out of range");
        let prep_time = minutes(recipe.prep_time)?;
        let cook_time = minutes(recipe.cook_time)?;
        let servings = i32::try_from(recipe.servings).context("servings out of range")?;

        let mut tx = self.db.begin().await.context("begin tx")?;

        let (recipe_id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO recipes
                (user_id, name, description, source, ingredients, instructions, nutrition,
                 prep_time, cook_time, servings, difficulty, cuisine_type)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(&recipe.name)
        .bind(&recipe.description)
        .bind(&recipe.source)
        .bind(Json(&recipe.ingredients))
        .bind(Json(&recipe.instructions))
        .bind(Json(&recipe.nutrition))
        .bind(prep_time)
        .bind(cook_time)
        .bind(servings)
        .bind(recipe.difficulty.as_str())
        .bind(&recipe.cuisine_type)
        .fetch_one(&mut *tx)
        .await
        .context("insert recipe")?;

        sqlx::query(
            r#"
            INSERT INTO saved_recipes (user_id, recipe_id)
            VALUES ($1, $2)
            "#,
        )
        .bind(user_id)
        .bind(recipe_id)
        .execute(&mut *tx)
        .await
        .context("insert saved recipe")?;

        tx.commit().await.context("commit tx")?;
        Ok(recipe_id)
    }

    async fn list_saved(&self, user_id: Uuid) -> anyhow::Result<Vec<SavedRecipeEntry>> {
        let saved = sqlx::query_as::<_, SavedRow>(
            r#"
            SELECT id, recipe_id, is_favorite, notes
            FROM saved_recipes
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("list saved recipes")?;

        let ids: Vec<Uuid> = saved.iter().map(|s| s.recipe_id).collect();
        let recipes = sqlx::query_as::<_, RecipeRow>(
            r#"
            SELECT id, name, description, source, ingredients, instructions, nutrition,
                   prep_time, cook_time, servings, difficulty, cuisine_type, created_at
            FROM recipes
            WHERE id = ANY($1)
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.db)
        .await
        .context("load saved recipe bodies")?;

        let mut by_id = HashMap::with_capacity(recipes.len());
        for row in recipes {
            let stored = StoredRecipe::try_from(row)?;
            by_id.insert(stored.id, stored);
        }

        Ok(saved
            .into_iter()
            .map(|s| SavedRecipeEntry {
                recipe: by_id.get(&s.recipe_id).cloned(),
                saved_recipe: s.into(),
            })
            .collect())
    }

    async fn update_saved(
        &self,
        user_id: Uuid,
        saved_id: Uuid,
        update: &SavedRecipeUpdate,
    ) -> anyhow::Result<Option<SavedRecipe>> {
        let row = sqlx::query_as::<_, SavedRow>(
            r#"
            UPDATE saved_recipes
               SET is_favorite = COALESCE($3, is_favorite),
                   notes = CASE
                       WHEN $4::text IS NULL THEN notes
                       WHEN $4::text = '' THEN NULL
                       ELSE $4::text
                   END
             WHERE id = $1 AND user_id = $2
            RETURNING id, recipe_id, is_favorite, notes
            "#,
        )
        .bind(saved_id)
        .bind(user_id)
        .bind(update.is_favorite)
        .bind(&update.notes)
        .fetch_optional(&self.db)
        .await
        .context("update saved recipe")?;
        Ok(row.map(SavedRecipe::from))
    }
}
