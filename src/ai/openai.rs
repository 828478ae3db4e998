use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{http_client, send_json, GenerateError, GenerationOptions, Generator};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 1],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Chat Completions client
#[derive(Clone)]
pub struct OpenAIClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAIClient {
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

fn first_choice_text(completion: ChatCompletion) -> Result<String, GenerateError> {
    let choice = completion
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| GenerateError::MalformedResponse("no choices in response".to_string()))?;

    match choice.message.and_then(|m| m.content).filter(|c| !c.is_empty()) {
        Some(content) => Ok(content),
        None if choice.finish_reason.as_deref() == Some("content_filter") => {
            Err(GenerateError::Blocked("content_filter".to_string()))
        }
        None => Err(GenerateError::MalformedResponse(
            "choice contained no content".to_string(),
        )),
    }
}

#[async_trait]
impl Generator for OpenAIClient {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, GenerateError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
            temperature: options.temperature,
            max_tokens: options.max_output_tokens,
        };

        let completion = send_json(
            self.client
                .post(format!("{}/v1/chat/completions", self.base_url))
                .bearer_auth(&self.api_key)
                .json(&request),
        )
        .await?;

        first_choice_text(completion)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    #[tokio::test]
    async fn test_generate_returns_first_choice() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(json!({
                "model": "gpt-4o-mini",
                "max_tokens": 1500,
                "messages": [{ "role": "user", "content": "a bakery site" }]
            })))
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"<html></html>"},"finish_reason":"stop"}]}"#)
            .create_async()
            .await;

        let client = OpenAIClient::new("sk-test", "gpt-4o-mini").with_base_url(&server.url());
        let text = client
            .generate("a bakery site", &GenerationOptions::default())
            .await
            .unwrap();

        assert_eq!(text, "<html></html>");
        mock.assert_async().await;
    }

    #[test]
    fn test_content_filter_is_blocked() {
        let completion: ChatCompletion = serde_json::from_str(
            r#"{"choices":[{"message":{"content":null},"finish_reason":"content_filter"}]}"#,
        )
        .unwrap();
        assert!(matches!(
            first_choice_text(completion),
            Err(GenerateError::Blocked(_))
        ));
    }

    #[test]
    fn test_empty_choices_is_malformed() {
        let completion: ChatCompletion = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(
            first_choice_text(completion),
            Err(GenerateError::MalformedResponse(_))
        ));
    }
}
