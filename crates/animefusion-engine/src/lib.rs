use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use animefusion_contracts::ViewAngle;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

mod dryrun;
mod error;
mod gemini;
mod orchestrator;
mod studio;

pub use dryrun::DryrunImageService;
pub use error::{
    GenerationError, ServiceError, MISSING_CREDENTIAL_MESSAGE, UNKNOWN_FAILURE_MESSAGE,
};
pub use gemini::{GeminiImageService, DEFAULT_GEMINI_MODEL};
pub use orchestrator::Orchestrator;
pub use studio::{Studio, StudioOptions};

/// One prompt sent to an image service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub prompt: String,
    pub model: String,
    pub api_key: String,
    /// Camera angle the prompt was built for.
    pub view: ViewAngle,
}

/// Inline image bytes returned by a service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImagePayload {
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn to_data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            BASE64.encode(&self.bytes)
        )
    }

    pub fn from_data_uri(uri: &str) -> Result<Self> {
        let Some(rest) = uri.strip_prefix("data:") else {
            bail!("not a data URI");
        };
        let Some((meta, data)) = rest.split_once(',') else {
            bail!("data URI has no payload");
        };
        let Some(mime_type) = meta.strip_suffix(";base64") else {
            bail!("data URI is not base64 encoded");
        };
        let bytes = BASE64
            .decode(data.trim().as_bytes())
            .context("data URI base64 decode failed")?;
        Ok(Self::new(mime_type, bytes))
    }

    pub fn extension(&self) -> &'static str {
        let lowered = self.mime_type.to_ascii_lowercase();
        if lowered.contains("jpeg") || lowered.contains("jpg") {
            return "jpg";
        }
        if lowered.contains("webp") {
            return "webp";
        }
        "png"
    }
}

/// Remote (or local stand-in) text-to-image backend.
pub trait ImageService: Send + Sync {
    fn name(&self) -> &str;
    fn generate(&self, request: &ImageRequest) -> Result<ImagePayload, ServiceError>;
}

#[derive(Default)]
pub struct ImageServiceRegistry {
    services: BTreeMap<String, Arc<dyn ImageService>>,
}

impl ImageServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<S: ImageService + 'static>(&mut self, service: S) {
        self.services
            .insert(service.name().to_string(), Arc::new(service));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ImageService>> {
        self.services.get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.services.keys().cloned().collect()
    }
}

pub fn default_registry() -> ImageServiceRegistry {
    let mut services = ImageServiceRegistry::new();
    services.register(DryrunImageService);
    services.register(GeminiImageService::new());
    services
}

pub(crate) fn error_chain_text(err: &anyhow::Error, max_chars: usize) -> String {
    let mut parts: Vec<String> = Vec::new();
    for cause in err.chain() {
        let text = cause.to_string();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            continue;
        }
        if parts
            .last()
            .map(|existing| existing == trimmed)
            .unwrap_or(false)
        {
            continue;
        }
        parts.push(trimmed.to_string());
    }
    if parts.is_empty() {
        return truncate_text(&err.to_string(), max_chars);
    }
    truncate_text(&parts.join(" | caused by: "), max_chars)
}

pub(crate) fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::*;

    #[test]
    fn data_uri_round_trip() -> Result<()> {
        let payload = ImagePayload::new("image/png", vec![137, 80, 78, 71]);
        let uri = payload.to_data_uri();
        assert_eq!(uri, "data:image/png;base64,iVBORw==");
        assert_eq!(ImagePayload::from_data_uri(&uri)?, payload);
        Ok(())
    }

    #[test]
    fn from_data_uri_rejects_remote_urls() {
        assert!(ImagePayload::from_data_uri("https://example.test/a.png").is_err());
        assert!(ImagePayload::from_data_uri("data:image/png,rawbytes").is_err());
    }

    #[test]
    fn extension_follows_mime_type() {
        assert_eq!(ImagePayload::new("image/jpeg", vec![]).extension(), "jpg");
        assert_eq!(ImagePayload::new("image/webp", vec![]).extension(), "webp");
        assert_eq!(ImagePayload::new("application/octet-stream", vec![]).extension(), "png");
    }

    #[test]
    fn default_registry_lists_services() {
        let registry = default_registry();
        assert_eq!(registry.names(), vec!["dryrun", "gemini"]);
        assert!(registry.get("gemini").is_some());
        assert!(registry.get("openai").is_none());
    }

    #[test]
    fn error_chain_text_joins_unique_causes() {
        let err = anyhow!("socket closed")
            .context("Gemini request failed (https://example.test)")
            .context("Gemini request failed (https://example.test)");
        let rendered = error_chain_text(&err, 200);
        assert_eq!(
            rendered,
            "Gemini request failed (https://example.test) | caused by: socket closed"
        );
        assert_eq!(truncate_text("abcdef", 3), "abc…");
    }
}
