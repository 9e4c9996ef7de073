//! Short-lived staging of inline photos so the analyzer can fetch them by URL.

use anyhow::Context;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::storage::StorageClient;

/// Lifetime of the URL handed to the analyzer.
pub const PRESIGN_TTL_SECS: u64 = 10 * 60;

pub fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

/// Decodes standard base64, tolerating a `data:<mime>;base64,` prefix.
pub fn decode_inline(b64: &str) -> anyhow::Result<Bytes> {
    let payload = match b64.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => b64,
    };
    let bytes = STANDARD
        .decode(payload.trim())
        .context("invalid base64 image")?;
    anyhow::ensure!(!bytes.is_empty(), "empty image");
    Ok(Bytes::from(bytes))
}

pub struct StagedImage {
    pub key: String,
    pub url: String,
}

/// Uploads the photo and presigns a GET for it.
pub async fn stage(
    storage: &dyn StorageClient,
    user_id: Uuid,
    body: Bytes,
    content_type: &str,
) -> anyhow::Result<StagedImage> {
    let ext = ext_from_mime(content_type).unwrap_or("bin");
    let key = format!("identify/{}/{}.{}", user_id, Uuid::new_v4(), ext);
    storage
        .put_object(&key, body, content_type)
        .await
        .with_context(|| format!("stage {key}"))?;
    let url = match storage.presign_get(&key, PRESIGN_TTL_SECS).await {
        Ok(url) => url,
        Err(e) => {
            discard(storage, &key).await;
            return Err(e.context("presign staged image"));
        }
    };
    debug!(%key, "image staged");
    Ok(StagedImage { key, url })
}

/// Best effort; a leftover object is logged, never surfaced.
pub async fn discard(storage: &dyn StorageClient, key: &str) {
    if let Err(e) = storage.delete_object(key).await {
        warn!(error = %e, %key, "failed to delete staged image");
    }
}
