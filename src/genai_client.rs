use crate::config::Config;
use crate::errors::AppError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// One call to the generative model: the instruction plus the declared output shape.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub instruction: String,
    pub response_schema: Value,
}

/// The external generative capability.
///
/// Returns the raw text the model produced; parsing and validation belong to
/// the generation service.
#[async_trait]
pub trait PortfolioModel: Send + Sync {
    async fn generate(&self, request: &ModelRequest) -> Result<String, AppError>;

    /// Model identifier for logs.
    fn name(&self) -> &str;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'static str,
    response_schema: &'a Value,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Client for the Gemini `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    /// Creates a new `GeminiClient`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - API root, e.g. `https://generativelanguage.googleapis.com`.
    /// * `model` - Model identifier, e.g. `gemini-2.0-flash`.
    /// * `api_key` - The API key sent in the `x-goog-api-key` header.
    /// * `timeout` - Transport-level timeout for a single request.
    pub fn new(
        base_url: String,
        model: String,
        api_key: String,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                AppError::ExternalApiError(format!("Failed to create Gemini client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            api_key,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Self::new(
            config.genai_base_url.clone(),
            config.genai_model.clone(),
            config.genai_api_key.clone(),
            Duration::from_secs(config.generation_timeout_secs),
        )
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl PortfolioModel for GeminiClient {
    /// Sends the instruction with a JSON response schema and returns the first
    /// candidate's text.
    async fn generate(&self, request: &ModelRequest) -> Result<String, AppError> {
        let url = self.endpoint();
        tracing::info!("Requesting portfolios from model {}", self.model);
        tracing::debug!(
            "Gemini URL: {} (instruction {} chars)",
            url,
            request.instruction.len()
        );

        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part {
                    text: &request.instruction,
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: &request.response_schema,
            },
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::ExternalApiError("Gemini request timed out".to_string())
                } else {
                    AppError::ExternalApiError(format!("Gemini request failed: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let snippet: String = error_text.chars().take(200).collect();
            return Err(AppError::ExternalApiError(format!(
                "Gemini returned {}: {}",
                status, snippet
            )));
        }

        let data: GenerateContentResponse = response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse Gemini response: {}", e))
        })?;

        let text = data
            .candidates
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.content)
            .and_then(|c| c.parts)
            .and_then(|p| p.into_iter().find_map(|part| part.text))
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| {
                AppError::ExternalApiError("Gemini response contained no text".to_string())
            })?;

        tracing::info!("✓ Model {} answered ({} chars)", self.model, text.len());
        Ok(text)
    }

    fn name(&self) -> &str {
        &self.model
    }
}
