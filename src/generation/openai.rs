//! OpenAI Chat Completions client.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::{GenerationError, TextGenerator};
use crate::config::OpenAiConfig;

/// OpenAI API client
pub struct OpenAiGenerator {
    model: String,
    api_key: String,
    base_url: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl OpenAiGenerator {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            model: model.into(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Create a client when the configured API key variable is set.
    pub fn from_config(
        config: &OpenAiConfig,
        timeout: Duration,
    ) -> Result<Option<Self>, GenerationError> {
        let Some(api_key) = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
        else {
            return Ok(None);
        };
        Self::new(&config.base_url, &config.model, api_key, timeout).map(Some)
    }

    fn request_body(&self, role: &str, prompt: &str) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": role },
                { "role": "user", "content": prompt },
            ],
        })
    }
}

/// Extract the first choice's text from a chat completion body.
fn parse_chat_response(body: &str) -> Result<String, GenerationError> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| GenerationError::InvalidPayload(e.to_string()))?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| GenerationError::InvalidPayload("completion has no content".to_string()))
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    async fn generate(&self, role: &str, prompt: &str) -> Result<String, GenerationError> {
        let url = format!("{}/chat/completions", self.base_url);
        tracing::debug!(model = %self.model, "openai: sending chat completion");

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(role, prompt))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(GenerationError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        parse_chat_response(&body)
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_first_choice() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Hello"}},{"message":{"content":"ignored"}}]}"#;
        assert_eq!(parse_chat_response(body).unwrap(), "Hello");
    }

    #[test]
    fn empty_choices_are_invalid() {
        let err = parse_chat_response(r#"{"choices":[]}"#).unwrap_err();
        assert!(matches!(err, GenerationError::InvalidPayload(_)));

        let err = parse_chat_response(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap_err();
        assert!(matches!(err, GenerationError::InvalidPayload(_)));
    }

    #[test]
    fn request_carries_role_and_prompt() {
        let client = OpenAiGenerator::new(
            "https://api.example.com/v1/",
            "gpt-4o-mini",
            "key",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(client.base_url, "https://api.example.com/v1");

        let body = client.request_body("be brief", "hello");
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "be brief");
        assert_eq!(body["messages"][1]["content"], "hello");
    }
}
