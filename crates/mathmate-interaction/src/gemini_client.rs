//! GeminiClient - Direct REST API implementation for Gemini.
//!
//! This client calls the Gemini REST API directly. Configuration is loaded
//! from secret.json (or the GEMINI_API_KEY environment variable).

use mathmate_core::capability::SolveCapability;
use mathmate_core::error::{MathMateError, Result};
use mathmate_core::solve::{PromptPart, PromptPayload};
use mathmate_infrastructure::SecretStore;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

pub(crate) const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub(crate) const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Client for the Gemini `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    /// Creates a new client with the provided API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Loads configuration from secret.json / the environment.
    ///
    /// Model name defaults to `gemini-2.5-flash` if not specified.
    pub fn try_from_config() -> Result<Self> {
        let store = SecretStore::at_default_location()?;
        let secret = store.resolve_gemini()?;
        let model = secret
            .model
            .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());
        Ok(Self::new(secret.api_key, model))
    }

    /// Overrides the model after construction.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub(crate) fn api_key(&self) -> &str {
        &self.api_key
    }

    pub(crate) fn model(&self) -> &str {
        &self.model
    }

    pub(crate) fn http(&self) -> &Client {
        &self.client
    }

    fn build_parts(payload: &PromptPayload) -> Result<Vec<Part>> {
        let mut parts = Vec::new();
        for part in &payload.parts {
            match part {
                PromptPart::Text(text) => {
                    if !text.trim().is_empty() {
                        parts.push(Part::Text { text: text.clone() });
                    }
                }
                PromptPart::InlineImage {
                    mime_type,
                    data_base64,
                } => parts.push(Part::InlineData {
                    inline_data: InlineDataPayload {
                        mime_type: mime_type.clone(),
                        data: data_base64.clone(),
                    },
                }),
            }
        }

        if parts.is_empty() {
            return Err(MathMateError::internal(
                "Gemini payload must include text or an inline image",
            ));
        }

        Ok(parts)
    }

    async fn send_request(&self, body: &GenerateContentRequest) -> Result<String> {
        let url = format!(
            "{}/{model}:generateContent?key={api_key}",
            BASE_URL,
            model = self.model,
            api_key = self.api_key
        );

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|err| {
                MathMateError::transport(format!("Gemini API request failed: {err}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|err| {
            MathMateError::transport(format!("Failed to parse Gemini response: {err}"))
        })?;

        extract_text_response(parsed)
    }
}

#[async_trait::async_trait]
impl SolveCapability for GeminiClient {
    async fn generate(&self, payload: &PromptPayload) -> Result<String> {
        let contents = vec![Content {
            role: "user".to_string(),
            parts: Self::build_parts(payload)?,
        }];

        let request = GenerateContentRequest {
            contents,
            system_instruction: None,
        };
        self.send_request(&request).await
    }
}

#[derive(Serialize)]
pub(crate) struct GenerateContentRequest {
    pub(crate) contents: Vec<Content>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    pub(crate) system_instruction: Option<Content>,
}

#[derive(Serialize)]
pub(crate) struct Content {
    pub(crate) role: String,
    pub(crate) parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
pub(crate) enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineDataPayload,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InlineDataPayload {
    pub(crate) mime_type: String,
    pub(crate) data: String,
}

#[derive(Deserialize)]
pub(crate) struct GenerateContentResponse {
    pub(crate) candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
pub(crate) struct Candidate {
    pub(crate) content: Option<ContentResponse>,
}

#[derive(Deserialize)]
pub(crate) struct ContentResponse {
    pub(crate) parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
pub(crate) struct PartResponse {
    pub(crate) text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[allow(dead_code)]
    code: Option<i32>,
    message: Option<String>,
    status: Option<String>,
}

pub(crate) fn extract_text_response(response: GenerateContentResponse) -> Result<String> {
    response
        .candidates
        .and_then(|mut candidates| candidates.pop())
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().find_map(|part| part.text))
        .ok_or_else(|| {
            MathMateError::transport("Gemini API returned no text in the response candidates")
        })
}

/// Maps an HTTP failure to the transport failure taxonomy
/// (unauthenticated / quota / unavailable / other).
pub(crate) fn map_http_error(status: StatusCode, body: String) -> MathMateError {
    let message = serde_json::from_str::<ErrorWrapper>(&body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.clone());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.clone());

    let category = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => "unauthenticated",
        StatusCode::TOO_MANY_REQUESTS => "quota",
        StatusCode::INTERNAL_SERVER_ERROR
        | StatusCode::BAD_GATEWAY
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::GATEWAY_TIMEOUT => "unavailable",
        _ => "other",
    };

    MathMateError::transport(format!("{category} ({}): {message}", status.as_u16()))
}
