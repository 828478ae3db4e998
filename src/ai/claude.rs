use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{http_client, send_json, GenerateError, GenerationOptions, Generator};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
}

/// Only text blocks carry output; other block types have no `text`
#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

/// Anthropic Messages API client
#[derive(Clone)]
pub struct ClaudeClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl ClaudeClient {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.client = http_client(timeout);
        self
    }
}

fn joined_text(response: MessagesResponse) -> Result<String, GenerateError> {
    let text: String = response.content.into_iter().filter_map(|b| b.text).collect();
    if !text.is_empty() {
        return Ok(text);
    }

    match response.stop_reason {
        Some(reason) if reason == "refusal" => Err(GenerateError::Blocked(reason)),
        _ => Err(GenerateError::MalformedResponse(
            "response contained no text blocks".to_string(),
        )),
    }
}

#[async_trait]
impl Generator for ClaudeClient {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, GenerateError> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: options.max_output_tokens,
            temperature: options.temperature,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = send_json(
            self.client
                .post(format!("{}/v1/messages", self.base_url))
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", API_VERSION)
                .json(&request),
        )
        .await?;

        joined_text(response)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn test_generate_joins_text_blocks() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .match_header("x-api-key", "ant-key")
            .match_header("anthropic-version", API_VERSION)
            .with_status(200)
            .with_body(r#"{"content":[{"type":"text","text":"<html>"},{"type":"text","text":"</html>"}],"stop_reason":"end_turn"}"#)
            .create_async()
            .await;

        let client = ClaudeClient::new("ant-key", "claude-test").with_base_url(&server.url());
        let text = client
            .generate("x", &GenerationOptions::default())
            .await
            .unwrap();

        assert_eq!(text, "<html></html>");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_overloaded_maps_to_api_error() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/v1/messages")
            .with_status(529)
            .with_body(r#"{"type":"error","error":{"type":"overloaded_error"}}"#)
            .create_async()
            .await;

        let client = ClaudeClient::new("k", "claude-test").with_base_url(&server.url());
        let err = client
            .generate("x", &GenerationOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, GenerateError::Api { status: 529, .. }));
    }

    #[test]
    fn test_refusal_is_blocked() {
        let response: MessagesResponse =
            serde_json::from_str(r#"{"content":[],"stop_reason":"refusal"}"#).unwrap();
        assert!(matches!(joined_text(response), Err(GenerateError::Blocked(_))));
    }
}
