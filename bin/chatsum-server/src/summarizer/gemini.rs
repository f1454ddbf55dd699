//! Gemini-backed summarizer.
//!
//! One `generateContent` call per summary, no retries. Any failure (HTTP
//! error, timeout, unexpected body) is logged and answered with the local
//! heuristic summary instead.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{Summarizer, SummarizerError, SummaryOutcome, fallback};
use crate::config::GeminiConfig;

/// Text returned when no API key is configured.
pub const NOT_CONFIGURED_MESSAGE: &str =
    "Error: Gemini API key not configured. Please set the GEMINI_API_KEY environment variable.";

const API_KEY_HEADER: &str = "x-goog-api-key";

/// A model advertised by the Gemini `models` endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    /// Fully-qualified name, e.g. `models/gemini-1.5-flash`.
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

impl ModelInfo {
    pub fn supports_generate_content(&self) -> bool {
        self.supported_generation_methods
            .iter()
            .any(|m| m == "generateContent")
    }
}

/// Summarizer that calls the Gemini REST API.
pub struct GeminiSummarizer {
    client: Client,
    config: GeminiConfig,
}

impl GeminiSummarizer {
    /// Build the HTTP client. The configured timeout bounds every request.
    pub fn new(config: GeminiConfig) -> Result<Self, SummarizerError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("chatsum-server/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SummarizerError::Config(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn api_key(&self) -> Result<&SecretString, SummarizerError> {
        self.config
            .api_key
            .as_ref()
            .ok_or_else(|| SummarizerError::Config("GEMINI_API_KEY is not set".to_owned()))
    }

    /// Send `prompt` to `model` and return the generated text.
    pub async fn generate(&self, model: &str, prompt: &str) -> Result<String, SummarizerError> {
        #[derive(Serialize)]
        struct GenerateRequest<'a> {
            contents: Vec<Content<'a>>,
        }

        #[derive(Serialize)]
        struct Content<'a> {
            role: &'a str,
            parts: Vec<Part<'a>>,
        }

        #[derive(Serialize)]
        struct Part<'a> {
            text: &'a str,
        }

        let api_key = self.api_key()?;
        let model = model.trim_start_matches("models/");
        let url = format!("{}/models/{}:generateContent", self.config.base_url, model);

        let request = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
        };

        debug!(%model, prompt_len = prompt.len(), "calling Gemini generateContent");

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizerError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response.json().await?;
        extract_text(&body)
            .ok_or_else(|| SummarizerError::Parse("response contains no text".to_owned()))
    }

    /// List models visible to the configured key.
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, SummarizerError> {
        #[derive(Deserialize)]
        struct ListModelsResponse {
            #[serde(default)]
            models: Vec<ModelInfo>,
        }

        let api_key = self.api_key()?;
        let url = format!("{}/models?pageSize=1000", self.config.base_url);

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, api_key.expose_secret())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizerError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: ListModelsResponse = response.json().await?;
        Ok(body.models)
    }
}

#[async_trait]
impl Summarizer for GeminiSummarizer {
    async fn summarize(&self, transcript: &str, target_words: u32) -> SummaryOutcome {
        if !self.is_configured() {
            warn!("GEMINI_API_KEY not set; returning configuration notice");
            return SummaryOutcome::NotConfigured(NOT_CONFIGURED_MESSAGE.to_owned());
        }

        let prompt = build_prompt(transcript, target_words);
        match self.generate(&self.config.model, &prompt).await {
            Ok(text) => {
                info!(model = %self.config.model, summary_len = text.len(), "summary generated");
                SummaryOutcome::Generated(text)
            }
            Err(e) => {
                warn!(model = %self.config.model, error = %e, "Gemini summarization failed; using fallback");
                SummaryOutcome::Fallback {
                    text: fallback::summarize(transcript, target_words),
                    reason: e.to_string(),
                }
            }
        }
    }
}

fn build_prompt(transcript: &str, target_words: u32) -> String {
    format!("Summarize the following conversation in about {target_words} words:\n\n{transcript}")
}

/// Pull the generated text out of a response body.
///
/// A top-level `text` string wins; otherwise the first part of the first
/// candidate is used.
fn extract_text(body: &Value) -> Option<String> {
    if let Some(text) = body.get("text").and_then(Value::as_str) {
        return Some(text.to_owned());
    }

    body.get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)?
        .get("text")?
        .as_str()
        .map(str::to_owned)
}
