//! Model provider clients behind a common [`Generator`] port

pub mod claude;
pub mod gemini;
pub mod openai;

pub use claude::ClaudeClient;
pub use gemini::GeminiClient;
pub use openai::OpenAIClient;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

use crate::provider::Provider;

pub const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 1500;

/// Sampling settings passed with every generation request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    #[error("authentication failed ({status}): {body}")]
    Auth { status: u16, body: String },
    #[error("quota exceeded: {0}")]
    Quota(String),
    #[error("provider returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("prompt blocked: {0}")]
    Blocked(String),
    /// The reply held nothing but fences or whitespace
    #[error("empty response")]
    EmptyResponse,
}

impl From<reqwest::Error> for GenerateError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GenerateError::Timeout
        } else if e.is_decode() {
            GenerateError::MalformedResponse(e.to_string())
        } else {
            GenerateError::Network(e.to_string())
        }
    }
}

impl GenerateError {
    /// Map a non-success HTTP status and its body to an error
    pub(crate) fn from_status(status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GenerateError::Auth {
                status: status.as_u16(),
                body,
            },
            StatusCode::TOO_MANY_REQUESTS => GenerateError::Quota(body),
            _ => GenerateError::Api {
                status: status.as_u16(),
                body,
            },
        }
    }
}

/// Black-box text generation: one prompt in, one completion out.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, GenerateError>;

    fn model(&self) -> &str;
}

/// Build a reqwest client, falling back to the default one if the builder
/// rejects the settings.
pub(crate) fn http_client(timeout: Option<Duration>) -> Client {
    let mut builder = Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Falling back to default HTTP client");
        Client::new()
    })
}

/// Send a request and decode the JSON reply.
///
/// The body is read as text first so a non-success status keeps the
/// provider's error message, and an unparseable body is reported as
/// [`GenerateError::MalformedResponse`] rather than a transport error.
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: RequestBuilder,
) -> Result<T, GenerateError> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(GenerateError::from_status(status, body));
    }
    serde_json::from_str(&body).map_err(|e| GenerateError::MalformedResponse(e.to_string()))
}

/// Create the generator for the configured provider.
pub fn build_generator(
    provider: Provider,
    api_key: &str,
    model: &str,
    timeout: Option<Duration>,
) -> Arc<dyn Generator> {
    match provider {
        Provider::Gemini => Arc::new(GeminiClient::new(api_key, model).with_timeout(timeout)),
        Provider::OpenAI => Arc::new(OpenAIClient::new(api_key, model).with_timeout(timeout)),
        Provider::Claude => Arc::new(ClaudeClient::new(api_key, model).with_timeout(timeout)),
    }
}
