/// A photo produced by the capture collaborator.
///
/// Deliberately not `Clone`: it is moved into exactly one identification call.
#[derive(Debug, PartialEq, Eq)]
pub struct ImageReference {
    pub uri: String,
    pub mime_hint: Option<String>,
}

impl ImageReference {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            mime_hint: None,
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime_hint = Some(mime.into());
        self
    }

    /// Remote URLs are forwarded as-is; everything else is read from disk.
    pub fn is_remote(&self) -> bool {
        self.uri.starts_with("http://") || self.uri.starts_with("https://")
    }

    /// Filesystem path for a local reference (`file://` stripped).
    pub fn local_path(&self) -> Option<&str> {
        if self.is_remote() {
            return None;
        }
        Some(self.uri.strip_prefix("file://").unwrap_or(&self.uri))
    }

    /// Best-effort MIME type: the hint, else guessed from the extension.
    pub fn content_type(&self) -> &str {
        if let Some(hint) = self.mime_hint.as_deref() {
            return hint;
        }
        let lower = self.uri.to_ascii_lowercase();
        if lower.ends_with(".png") {
            "image/png"
        } else if lower.ends_with(".webp") {
            "image/webp"
        } else if lower.ends_with(".heic") {
            "image/heic"
        } else {
            "image/jpeg"
        }
    }
}
