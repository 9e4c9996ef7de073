use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use crate::analyzer::{HttpAnalyzer, MealAnalyzer};
use crate::auth::{PgUserRepo, UserRepo};
use crate::config::AppConfig;
use crate::meals::{MealRepo, PgMealRepo};
use crate::recipes::{PgRecipeRepo, RecipeRepo};
use crate::storage::{S3Storage, StorageClient};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserRepo>,
    pub meals: Arc<dyn MealRepo>,
    pub recipes: Arc<dyn RecipeRepo>,
    pub storage: Arc<dyn StorageClient>,
    pub analyzer: Arc<dyn MealAnalyzer>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
            warn!(error = %e, "migration failed; continuing");
        }

        let storage = Arc::new(S3Storage::connect(&config.storage).await?) as Arc<dyn StorageClient>;
        let analyzer = Arc::new(HttpAnalyzer::new(&config.analyzer)?) as Arc<dyn MealAnalyzer>;
        info!(analyzer = %config.analyzer.base_url, "backend state ready");

        Ok(Self {
            users: Arc::new(PgUserRepo::new(db.clone())),
            meals: Arc::new(PgMealRepo::new(db.clone())),
            recipes: Arc::new(PgRecipeRepo::new(db)),
            storage,
            analyzer,
            config,
        })
    }

    /// In-memory state for handler tests; no database or network.
    #[cfg(test)]
    pub fn fake() -> Self {
        crate::testing::FakeBackend::new().state
    }
}
