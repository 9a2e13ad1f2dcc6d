/// Completion Client — the single point of entry for all completion API calls.
///
/// ARCHITECTURAL RULE: No other module may call the completion endpoint directly.
/// All text generation MUST go through this module.
///
/// Generation parameters are fixed (150 tokens, one candidate, no stop, temperature 0.7).
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

pub const DEFAULT_COMPLETION_API_URL: &str =
    "https://api.openai.com/v1/engines/text-davinci-002/completions";
const MAX_TOKENS: u32 = 150;
const CANDIDATES: u32 = 1;
const TEMPERATURE: f32 = 0.7;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Completion returned no choices")]
    EmptyChoices,
}

#[derive(Debug, Serialize)]
pub struct CompletionRequest<'a> {
    pub prompt: &'a str,
    pub max_tokens: u32,
    pub n: u32,
    pub stop: Option<&'a str>,
    pub temperature: f32,
}

impl<'a> CompletionRequest<'a> {
    pub fn new(prompt: &'a str) -> Self {
        Self {
            prompt,
            max_tokens: MAX_TOKENS,
            n: CANDIDATES,
            stop: None,
            temperature: TEMPERATURE,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompletionResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub text: String,
}

impl CompletionResponse {
    /// Text of the first candidate.
    pub fn first_text(&self) -> Result<&str, LlmError> {
        self.choices
            .first()
            .map(|c| c.text.as_str())
            .ok_or(LlmError::EmptyChoices)
    }
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Anything that can turn a prompt into completion candidates.
///
/// Carried in `AppState` as `Arc<dyn CompletionProvider>`.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<CompletionResponse, LlmError>;
}

/// The completion client used by the form controller.
/// A single POST per call; failures are returned, never retried.
#[derive(Clone)]
pub struct CompletionClient {
    client: Client,
    api_url: String,
    api_key: String,
}

impl CompletionClient {
    pub fn new(api_url: String, api_key: String) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            api_url,
            api_key,
        })
    }
}

#[async_trait]
impl CompletionProvider for CompletionClient {
    async fn complete(&self, prompt: &str) -> Result<CompletionResponse, LlmError> {
        let response = self
            .client
            .post(&self.api_url)
            .header("content-type", "application/json")
            .bearer_auth(&self.api_key)
            .json(&CompletionRequest::new(prompt))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("Completion API returned {}", status);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: api_error_message(body),
            });
        }

        let completion = parse_completion(&body)?;
        debug!(
            "Completion call succeeded: choices={}",
            completion.choices.len()
        );
        Ok(completion)
    }
}

/// Decodes a completion body. An absent or empty `choices` array is an error.
pub fn parse_completion(body: &str) -> Result<CompletionResponse, LlmError> {
    let completion: CompletionResponse = serde_json::from_str(body)?;
    if completion.choices.is_empty() {
        return Err(LlmError::EmptyChoices);
    }
    Ok(completion)
}

fn api_error_message(body: String) -> String {
    serde_json::from_str::<ApiError>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body)
}
