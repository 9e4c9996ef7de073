use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// S3-compatible bucket used to stage uploaded photos during identification.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
}

/// The external AI service that identifies meals, writes recipes and chats.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzerConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub storage: StorageConfig,
    pub analyzer: AnalyzerConfig,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET")?,
            issuer: env_or("JWT_ISSUER", "mealmind"),
            audience: env_or("JWT_AUDIENCE", "mealmind-users"),
            ttl_minutes: env_parse("JWT_TTL_MINUTES", 60),
            refresh_ttl_minutes: env_parse("JWT_REFRESH_TTL_MINUTES", 60 * 24 * 14),
        };
        let storage = StorageConfig {
            endpoint: std::env::var("MINIO_ENDPOINT").context("MINIO_ENDPOINT")?,
            bucket: env_or("MINIO_BUCKET", "meal-photos"),
            access_key: std::env::var("MINIO_ACCESS_KEY").context("MINIO_ACCESS_KEY")?,
            secret_key: std::env::var("MINIO_SECRET_KEY").context("MINIO_SECRET_KEY")?,
            region: env_or("MINIO_REGION", "us-east-1"),
        };
        let analyzer = AnalyzerConfig {
            base_url: std::env::var("ANALYZER_URL").context("ANALYZER_URL")?,
            api_key: std::env::var("ANALYZER_API_KEY").ok(),
            timeout_secs: env_parse("ANALYZER_TIMEOUT_SECS", 60),
        };
        Ok(Self {
            database_url,
            jwt,
            storage,
            analyzer,
        })
    }
}

/// Settings for [`crate::api::HttpMealApi`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub access_token: Option<String>,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            access_token: None,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn from_env() -> anyhow::Result<Self> {
        let base_url = std::env::var("MEALMIND_API_URL").context("MEALMIND_API_URL")?;
        Ok(Self {
            base_url,
            access_token: std::env::var("MEALMIND_TOKEN").ok(),
            timeout: Duration::from_secs(env_parse("MEALMIND_TIMEOUT_SECS", 30)),
        })
    }
}
