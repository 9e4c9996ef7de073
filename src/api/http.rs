use anyhow::Context;
use axum::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{
    ChatRequest, ChatResponse, CreateRecipeRequest, Created, GenerateRecipeRequest,
    IdentifyMealRequest, LogMealRequest, MealApi, RawRecipe, SavedRecipeUpdate,
};
use crate::config::ClientConfig;
use crate::domain::{IdentifiedMeal, ImageReference, LoggedMeal, SavedRecipe, SavedRecipeEntry};

/// [`MealApi`] over the backend's JSON routes.
#[derive(Clone)]
pub struct HttpMealApi {
    client: Client,
    base_url: String,
    access_token: Option<String>,
}

impl HttpMealApi {
    pub fn new(config: ClientConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_token: config.access_token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder, what: &str) -> anyhow::Result<T> {
        let resp = self
            .authed(req)
            .send()
            .await
            .with_context(|| format!("{what}: request"))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("{what}: {status}: {body}");
        }
        resp.json::<T>()
            .await
            .with_context(|| format!("{what}: decode response"))
    }
}

async fn identify_body(image: ImageReference) -> anyhow::Result<IdentifyMealRequest> {
    if image.is_remote() {
        return Ok(IdentifyMealRequest {
            image_url: Some(image.uri),
            ..Default::default()
        });
    }
    let content_type = image.content_type().to_string();
    let path = image.local_path().unwrap_or(&image.uri);
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("read image {path}"))?;
    Ok(IdentifyMealRequest {
        image_url: None,
        image_b64: Some(STANDARD.encode(bytes)),
        content_type: Some(content_type),
    })
}

#[async_trait]
impl MealApi for HttpMealApi {
    #[instrument(skip(self, image), fields(uri = %image.uri))]
    async fn identify_meal(&self, image: ImageReference) -> anyhow::Result<IdentifiedMeal> {
        let body = identify_body(image).await?;
        debug!(inline = body.image_b64.is_some(), "identify request");
        self.send(self.client.post(self.url("/ai/identify")).json(&body), "identify")
            .await
    }

    #[instrument(skip(self, req), fields(ingredients = req.ingredients.len()))]
    async fn generate_recipe(&self, req: GenerateRecipeRequest) -> anyhow::Result<RawRecipe> {
        self.send(self.client.post(self.url("/ai/recipe")).json(&req), "generate recipe")
            .await
    }

    #[instrument(skip(self, req), fields(turns = req.messages.len()))]
    async fn chat(&self, req: ChatRequest) -> anyhow::Result<ChatResponse> {
        self.send(self.client.post(self.url("/ai/chat")).json(&req), "chat")
            .await
    }

    #[instrument(skip(self, req), fields(dish = %req.dish_name))]
    async fn log_meal(&self, req: LogMealRequest) -> anyhow::Result<Created> {
        self.send(self.client.post(self.url("/meals")).json(&req), "log meal")
            .await
    }

    #[instrument(skip(self))]
    async fn get_history(&self, limit: u32) -> anyhow::Result<Vec<LoggedMeal>> {
        let req = self
            .client
            .get(self.url("/meals/history"))
            .query(&[("limit", limit)]);
        self.send(req, "get history").await
    }

    #[instrument(skip(self, req), fields(name = %req.name))]
    async fn create_recipe(&self, req: CreateRecipeRequest) -> anyhow::Result<Created> {
        self.send(self.client.post(self.url("/recipes")).json(&req), "create recipe")
            .await
    }

    #[instrument(skip(self))]
    async fn get_saved(&self) -> anyhow::Result<Vec<SavedRecipeEntry>> {
        self.send(self.client.get(self.url("/recipes/saved")), "get saved")
            .await
    }

    #[instrument(skip(self, update))]
    async fn update_saved(
        &self,
        id: Uuid,
        update: SavedRecipeUpdate,
    ) -> anyhow::Result<SavedRecipe> {
        let req = self
            .client
            .patch(self.url(&format!("/recipes/saved/{id}")))
            .json(&update);
        self.send(req, "update saved recipe").await
    }
}
