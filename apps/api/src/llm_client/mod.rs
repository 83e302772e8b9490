/// LLM Client — the single point of entry for all generative-model calls.
///
/// No other module talks to the Gemini API directly. Everything above this
/// layer depends on the `ModelClient` trait so tests can swap in canned output.
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,
}

impl LlmError {
    /// Transport failures, rate limits and server errors are worth another attempt.
    /// Auth and request errors are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::Http(_) => true,
            LlmError::Api { status, .. } => *status == 429 || *status >= 500,
            LlmError::Parse(_) | LlmError::EmptyContent => false,
        }
    }
}

/// Sampling parameters sent with every generation request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplingConfig {
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            top_p: 0.95,
        }
    }
}

/// "Send a prompt, get back text." Implementations must not interpret the text.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn generate(&self, prompt: &str, sampling: &SamplingConfig) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: SamplingConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
}

impl GenerateContentResponse {
    /// Extracts the text of the first candidate's first text part.
    pub fn text(&self) -> Option<&str> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.iter().find_map(|p| p.text.as_deref()))
    }
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

/// Gemini `generateContent` client. One request per call; no retries here.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, endpoint: String) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            api_key,
            model: model.trim_start_matches("models/").to_string(),
            endpoint,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn generate(&self, prompt: &str, sampling: &SamplingConfig) -> Result<String, LlmError> {
        let request_body = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: *sampling,
        };

        debug!("Calling {} with prompt of {} chars", self.model, prompt.len());

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GeminiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: GenerateContentResponse = serde_json::from_str(&response.text().await?)?;

        if let Some(usage) = &body.usage_metadata {
            debug!(
                "LLM call succeeded: prompt_tokens={}, output_tokens={}",
                usage.prompt_token_count, usage.candidates_token_count
            );
        }

        let text = body.text().ok_or(LlmError::EmptyContent)?;
        Ok(text.trim().to_string())
    }
}

const BASE_BACKOFF_MS: u64 = 1000;
/// Upper bound on configured attempts; keeps the total backoff finite.
const MAX_ATTEMPTS_CAP: u32 = 10;

/// Delay before retry number `attempt + 1`: 1s, 2s, 4s... saturating instead of overflowing.
fn backoff_delay(attempt: u32) -> std::time::Duration {
    let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
    std::time::Duration::from_millis(BASE_BACKOFF_MS.saturating_mul(factor))
}

/// Bounded retry policy wrapped around any `ModelClient`.
/// Retries only errors for which `LlmError::is_retryable` holds, backing off 1s, 2s, 4s...
pub struct RetryingModel<M> {
    inner: M,
    max_attempts: u32,
}

impl<M: ModelClient> RetryingModel<M> {
    pub fn new(inner: M, max_attempts: u32) -> Self {
        Self {
            inner,
            max_attempts: max_attempts.clamp(1, MAX_ATTEMPTS_CAP),
        }
    }
}

#[async_trait]
impl<M: ModelClient> ModelClient for RetryingModel<M> {
    async fn generate(&self, prompt: &str, sampling: &SamplingConfig) -> Result<String, LlmError> {
        let mut attempt = 0;
        loop {
            match self.inner.generate(prompt, sampling).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() && attempt + 1 < self.max_attempts => {
                    let delay = backoff_delay(attempt);
                    warn!(
                        "LLM call attempt {} failed ({e}), retrying after {}ms...",
                        attempt + 1,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
