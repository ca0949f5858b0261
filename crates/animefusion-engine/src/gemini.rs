use std::env;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::blocking::{Client as HttpClient, Response as HttpResponse};
use serde_json::{json, Value};

use crate::{error_chain_text, truncate_text, ImagePayload, ImageRequest, ImageService, ServiceError};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash-image";

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const REQUEST_TIMEOUT_S: f64 = 90.0;
const TRANSPORT_RETRIES: usize = 2;
const RETRY_BACKOFF_S: f64 = 1.2;

pub struct GeminiImageService {
    api_base: String,
    http: HttpClient,
    max_retries: usize,
    retry_backoff_s: f64,
}

impl Default for GeminiImageService {
    fn default() -> Self {
        Self::new()
    }
}

impl GeminiImageService {
    pub fn new() -> Self {
        let api_base = env::var("GEMINI_API_BASE")
            .ok()
            .map(|value| value.trim().trim_end_matches('/').to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        Self::with_api_base(api_base)
    }

    pub fn with_api_base(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            http: HttpClient::new(),
            max_retries: TRANSPORT_RETRIES,
            retry_backoff_s: RETRY_BACKOFF_S,
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn endpoint_for_model(&self, model: &str) -> String {
        let trimmed = model.trim();
        let trimmed = if trimmed.is_empty() {
            DEFAULT_GEMINI_MODEL
        } else {
            trimmed
        };
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{trimmed}")
        };
        format!("{}/{}:generateContent", self.api_base, model_path)
    }

    fn build_payload(request: &ImageRequest) -> Value {
        json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": request.prompt }],
            }],
            "generationConfig": {
                "responseModalities": ["IMAGE"],
            },
        })
    }

    fn post_with_transport_retries(
        &self,
        endpoint: &str,
        api_key: &str,
        payload: &Value,
    ) -> Result<HttpResponse> {
        let mut attempt = 0;
        loop {
            let response = self
                .http
                .post(endpoint)
                .query(&[("key", api_key)])
                .timeout(Duration::from_secs_f64(REQUEST_TIMEOUT_S))
                .json(payload)
                .send();

            match response {
                Ok(ok) => return Ok(ok),
                Err(raw) => {
                    let err = anyhow::Error::new(raw)
                        .context(format!("Gemini request failed ({endpoint})"));
                    if !is_retryable_transport_error(&err) || attempt >= self.max_retries {
                        return Err(err);
                    }
                    let delay_s = self.retry_backoff_s * (attempt as f64 + 1.0);
                    thread::sleep(Duration::from_secs_f64(delay_s));
                    attempt += 1;
                }
            }
        }
    }

    /// First inline image in the response, if any.
    fn extract_image(response_payload: &Value) -> Result<Option<ImagePayload>> {
        let candidates = response_payload
            .get("candidates")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        for candidate in candidates {
            let parts = candidate
                .get("content")
                .and_then(|content| content.get("parts"))
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            for part in parts {
                let Some(inline) = part
                    .get("inlineData")
                    .or_else(|| part.get("inline_data"))
                    .and_then(Value::as_object)
                else {
                    continue;
                };
                let data = inline
                    .get("data")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                if data.is_empty() {
                    continue;
                }
                let bytes = BASE64
                    .decode(data.as_bytes())
                    .context("Gemini image base64 decode failed")?;
                let mime_type = inline
                    .get("mimeType")
                    .or_else(|| inline.get("mime_type"))
                    .and_then(Value::as_str)
                    .unwrap_or("image/png");
                return Ok(Some(ImagePayload::new(mime_type, bytes)));
            }
        }
        Ok(None)
    }

    fn generate_inner(&self, request: &ImageRequest) -> Result<ImagePayload> {
        let endpoint = self.endpoint_for_model(&request.model);
        let payload = Self::build_payload(request);
        let response = self.post_with_transport_retries(&endpoint, &request.api_key, &payload)?;
        let response_payload = response_json_or_error(response)?;
        match Self::extract_image(&response_payload)? {
            Some(image) => Ok(image),
            None => {
                let reason = response_payload
                    .pointer("/promptFeedback/blockReason")
                    .and_then(Value::as_str)
                    .map(|reason| format!(" (blocked: {reason})"))
                    .unwrap_or_default();
                Err(anyhow!("Gemini returned no images{reason}"))
            }
        }
    }
}

impl ImageService for GeminiImageService {
    fn name(&self) -> &str {
        "gemini"
    }

    fn generate(&self, request: &ImageRequest) -> Result<ImagePayload, ServiceError> {
        self.generate_inner(request)
            .map_err(|err| ServiceError::Remote(error_chain_text(&err, 1024)))
    }
}

fn response_json_or_error(response: HttpResponse) -> Result<Value> {
    let status = response.status();
    let code = status.as_u16();
    let body = response
        .text()
        .context("Gemini response body read failed")?;
    if !status.is_success() {
        bail!("Gemini request failed ({code}): {}", service_message(&body));
    }
    let parsed: Value =
        serde_json::from_str(&body).context("Gemini returned invalid JSON payload")?;
    Ok(parsed)
}

/// The service's own error message when the body carries one.
fn service_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| truncate_text(body.trim(), 512))
}

fn is_retryable_transport_error(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<reqwest::Error>()
            .map(|reqwest_err| reqwest_err.is_timeout() || reqwest_err.is_connect())
            .unwrap_or(false)
    })
}
