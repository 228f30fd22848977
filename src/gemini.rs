//! Wire contract of the Gemini `generateContent` endpoint and the narrow
//! service interface the expansion client talks to.

use std::future::Future;

use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image-preview";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// A message segment: either text or inline binary data.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<Blob>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    pub mime_type: String,
    /// Base64 payload.
    pub data: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_modalities: Vec<Modality>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Modality {
    Image,
    Text,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    pub fn inline(mime_type: &str, bytes: &[u8]) -> Self {
        Self {
            text: None,
            inline_data: Some(Blob {
                mime_type: mime_type.to_string(),
                data: general_purpose::STANDARD.encode(bytes),
            }),
        }
    }
}

impl GenerateContentRequest {
    /// One user turn with the given parts, accepting image and text back.
    pub fn image_edit(parts: Vec<Part>) -> Self {
        Self {
            contents: vec![Content { role: None, parts }],
            generation_config: GenerationConfig {
                response_modalities: vec![Modality::Image, Modality::Text],
            },
        }
    }
}

/// Transport or service level failure, before classification.
///
/// `message` is `None` when the underlying error had nothing to say.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceFailure {
    pub message: Option<String>,
}

impl ServiceFailure {
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            message: if message.trim().is_empty() {
                None
            } else {
                Some(message)
            },
        }
    }

    pub fn silent() -> Self {
        Self { message: None }
    }

    /// Builds the failure for a non-success HTTP response.
    pub fn from_http(status: reqwest::StatusCode, body: &str) -> Self {
        match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(envelope) if !envelope.error.message.is_empty() => {
                if envelope.error.status.is_empty() {
                    Self::new(format!("HTTP {}: {}", status, envelope.error.message))
                } else {
                    Self::new(format!(
                        "HTTP {}: {}: {}",
                        status, envelope.error.status, envelope.error.message
                    ))
                }
            }
            _ if body.trim().is_empty() => Self::new(format!("HTTP {}", status)),
            _ => Self::new(format!("HTTP {}: {}", status, body.trim())),
        }
    }
}

impl From<reqwest::Error> for ServiceFailure {
    fn from(error: reqwest::Error) -> Self {
        Self::new(error.to_string())
    }
}

/// The only thing the expansion client needs from the generation backend.
pub trait ImageService {
    fn generate(
        &self,
        api_key: &str,
        request: &GenerateContentRequest,
    ) -> impl Future<Output = Result<GenerateContentResponse, ServiceFailure>> + Send;
}

/// `ImageService` backed by the Gemini REST API.
pub struct GeminiService {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl GeminiService {
    pub fn new(base_url: String, model: String) -> Self {
        let client = reqwest::Client::new();
        Self {
            client,
            base_url,
            model,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

impl Default for GeminiService {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL.to_string(), DEFAULT_MODEL.to_string())
    }
}

impl ImageService for GeminiService {
    async fn generate(
        &self,
        api_key: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, ServiceFailure> {
        let url = self.endpoint();
        log::info!("📤 POST {} (key {}...)", url, key_prefix(api_key));

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        log::info!("📨 Response received with status: {}", status);

        if !status.is_success() {
            let body = response.text().await?;
            log::error!("❌ HTTP Error {}: {}", status, body);
            return Err(ServiceFailure::from_http(status, &body));
        }

        let parsed: GenerateContentResponse = response.json().await?;
        log::debug!("📄 Response carries {} candidate(s)", parsed.candidates.len());
        Ok(parsed)
    }
}

/// First few characters of an API key, for logs.
pub fn key_prefix(api_key: &str) -> String {
    api_key.chars().take(4).collect()
}
