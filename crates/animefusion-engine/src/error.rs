use std::any::Any;

use crate::error_chain_text;

pub const UNKNOWN_FAILURE_MESSAGE: &str = "An unknown error occurred";
pub const MISSING_CREDENTIAL_MESSAGE: &str = "Missing API Key. Open Settings to enter a key.";

/// Failure reported by an [`crate::ImageService`].
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The service answered with an error, or with nothing usable.
    #[error("{0}")]
    Remote(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote(message.into())
    }
}

/// Why a generation produced no image.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("{}", MISSING_CREDENTIAL_MESSAGE)]
    MissingCredential,
    #[error("{message}")]
    RemoteFailure {
        message: String,
        detail: Option<String>,
    },
    #[error("{message}")]
    UnknownFailure {
        message: String,
        detail: Option<String>,
    },
}

impl GenerationError {
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::MissingCredential => "missing_credential",
            GenerationError::RemoteFailure { .. } => "remote_failure",
            GenerationError::UnknownFailure { .. } => "unknown_failure",
        }
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            GenerationError::MissingCredential => None,
            GenerationError::RemoteFailure { detail, .. }
            | GenerationError::UnknownFailure { detail, .. } => detail.as_deref(),
        }
    }

    /// Short text for a user-facing notification.
    pub fn notification(&self) -> &'static str {
        match self {
            GenerationError::MissingCredential => MISSING_CREDENTIAL_MESSAGE,
            _ => "Image generation failed. Check your API key or the log.",
        }
    }

    /// Coerces a worker panic payload into readable text.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|text| text.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());
        match message {
            Some(message) => GenerationError::UnknownFailure {
                detail: Some(format!("image service worker panicked: {message}")),
                message,
            },
            None => GenerationError::UnknownFailure {
                message: UNKNOWN_FAILURE_MESSAGE.to_string(),
                detail: Some("image service worker panicked".to_string()),
            },
        }
    }

    pub(crate) fn with_extra_detail(self, extra: &str) -> Self {
        let merge = |detail: Option<String>| match detail {
            Some(existing) if !existing.is_empty() => Some(format!("{existing}\n{extra}")),
            _ => Some(extra.to_string()),
        };
        match self {
            GenerationError::MissingCredential => GenerationError::MissingCredential,
            GenerationError::RemoteFailure { message, detail } => GenerationError::RemoteFailure {
                message,
                detail: merge(detail),
            },
            GenerationError::UnknownFailure { message, detail } => {
                GenerationError::UnknownFailure {
                    message,
                    detail: merge(detail),
                }
            }
        }
    }
}

impl From<ServiceError> for GenerationError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Remote(message) => {
                let message = message.trim().to_string();
                GenerationError::RemoteFailure {
                    message: if message.is_empty() {
                        "Image service returned an error".to_string()
                    } else {
                        message
                    },
                    detail: None,
                }
            }
            ServiceError::Other(err) => {
                let text = err.to_string();
                let message = Some(text.trim().to_string())
                    .filter(|text| !text.is_empty())
                    .or_else(|| {
                        Some(error_chain_text(&err, 512)).filter(|text| !text.trim().is_empty())
                    })
                    .unwrap_or_else(|| UNKNOWN_FAILURE_MESSAGE.to_string());
                let detail = format!("{err:?}");
                GenerationError::UnknownFailure {
                    message,
                    detail: Some(detail).filter(|text| !text.trim().is_empty()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::*;

    #[test]
    fn missing_credential_uses_one_message_everywhere() {
        let err = GenerationError::MissingCredential;
        assert_eq!(err.to_string(), MISSING_CREDENTIAL_MESSAGE);
        assert_eq!(err.notification(), MISSING_CREDENTIAL_MESSAGE);
        assert_eq!(err.detail(), None);
    }

    #[test]
    fn remote_errors_keep_service_message() {
        let err = GenerationError::from(ServiceError::remote("quota exceeded"));
        assert_eq!(
            err,
            GenerationError::RemoteFailure {
                message: "quota exceeded".to_string(),
                detail: None,
            }
        );
        assert_eq!(err.kind(), "remote_failure");
    }

    #[test]
    fn other_errors_become_unknown_with_detail() {
        let err = GenerationError::from(ServiceError::Other(
            anyhow!("disk full").context("writing cache"),
        ));
        assert_eq!(err.to_string(), "writing cache");
        assert!(err.detail().unwrap_or_default().contains("disk full"));
        assert_eq!(err.kind(), "unknown_failure");
    }

    #[test]
    fn blank_errors_fall_back_to_placeholder() {
        let err = GenerationError::from(ServiceError::Other(anyhow!("   ")));
        assert_eq!(err.to_string(), UNKNOWN_FAILURE_MESSAGE);
    }

    #[test]
    fn panic_payloads_are_coerced_to_text() {
        let from_str = GenerationError::from_panic(Box::new("worker exploded"));
        assert_eq!(from_str.to_string(), "worker exploded");

        let from_string = GenerationError::from_panic(Box::new(String::from("bad state")));
        assert_eq!(from_string.to_string(), "bad state");

        let opaque = GenerationError::from_panic(Box::new(42_u32));
        assert_eq!(opaque.to_string(), UNKNOWN_FAILURE_MESSAGE);
        assert!(opaque.detail().is_some());
    }

    #[test]
    fn missing_credential_notification_prompts_for_settings() {
        let err = GenerationError::MissingCredential;
        assert!(err.notification().contains("settings"));
        assert_eq!(err.detail(), None);
    }
}
