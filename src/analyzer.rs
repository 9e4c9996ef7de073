//! Client for the external AI service.
//!
//! The service owns model choice and prompting; this side only forwards
//! structured requests and hands back whatever JSON comes out.

use std::time::Duration;

use anyhow::Context;
use axum::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use crate::api::{ChatRequest, ChatResponse, GenerateRecipeRequest};
use crate::config::AnalyzerConfig;

#[async_trait]
pub trait MealAnalyzer: Send + Sync {
    /// Raw identification for the photo at `image_url`.
    async fn identify(&self, image_url: &str) -> anyhow::Result<Value>;
    async fn recipe(&self, req: &GenerateRecipeRequest) -> anyhow::Result<Value>;
    async fn chat(&self, req: &ChatRequest) -> anyhow::Result<String>;
}

pub struct HttpAnalyzer {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpAnalyzer {
    pub fn new(cfg: &AnalyzerConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("build analyzer client")?;
        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
        })
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> anyhow::Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.post(&url).json(body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let resp = req
            .send()
            .await
            .with_context(|| format!("analyzer {path}"))?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!("analyzer {path} returned {status}: {text}");
        }
        let value = resp
            .json::<Value>()
            .await
            .with_context(|| format!("analyzer {path}: decode"))?;
        debug!(%path, "analyzer responded");
        Ok(value)
    }
}

#[async_trait]
impl MealAnalyzer for HttpAnalyzer {
    #[instrument(skip(self, image_url))]
    async fn identify(&self, image_url: &str) -> anyhow::Result<Value> {
        self.post("/identify", &json!({ "imageUrl": image_url })).await
    }

    #[instrument(skip(self, req), fields(ingredients = req.ingredients.len()))]
    async fn recipe(&self, req: &GenerateRecipeRequest) -> anyhow::Result<Value> {
        self.post("/recipe", req).await
    }

    #[instrument(skip(self, req), fields(turns = req.messages.len()))]
    async fn chat(&self, req: &ChatRequest) -> anyhow::Result<String> {
        let value = self.post("/chat", req).await?;
        let reply: ChatResponse =
            serde_json::from_value(value).context("analyzer chat: missing response")?;
        Ok(reply.response)
    }
}
