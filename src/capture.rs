//! Seam to the device's camera and photo library.

use std::fmt;

use axum::async_trait;

use crate::domain::ImageReference;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureKind {
    Camera,
    Library,
}

impl fmt::Display for CaptureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureKind::Camera => f.write_str("camera"),
            CaptureKind::Library => f.write_str("photo library"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
}

#[derive(Debug)]
pub enum CaptureOutcome {
    Captured(ImageReference),
    Cancelled,
}

/// Implemented by the UI toolkit binding.
#[async_trait]
pub trait CaptureSource: Send + Sync {
    async fn request_permission(&self, kind: CaptureKind) -> Permission;
    async fn acquire(&self, kind: CaptureKind) -> anyhow::Result<CaptureOutcome>;
}
