//! IBM watsonx.ai text generation client.
//!
//! Authenticates by exchanging the API key for an IAM bearer token, cached
//! until shortly before it expires.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::{GenerationError, TextGenerator};
use crate::config::WatsonxConfig;

/// Refresh the IAM token this long before it expires.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

pub struct WatsonxGenerator {
    service_url: String,
    iam_url: String,
    version: String,
    model: String,
    project_id: String,
    api_key: String,
    max_new_tokens: u32,
    http: Client,
    token: Mutex<Option<CachedToken>>,
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

#[derive(Debug, Deserialize)]
struct IamTokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    #[serde(default)]
    results: Vec<GenerationResult>,
}

#[derive(Debug, Deserialize)]
struct GenerationResult {
    generated_text: String,
}

/// Wrap role and prompt in the Granite chat template.
pub fn render_chat_template(role: &str, prompt: &str) -> String {
    format!(
        "<|start_of_role|>system<|end_of_role|>{role}<|end_of_text|>\n\
         <|start_of_role|>user<|end_of_role|>{prompt}<|end_of_text|>\n\
         <|start_of_role|>assistant<|end_of_role|>"
    )
}

fn parse_generation_response(body: &str) -> Result<String, GenerationError> {
    let response: GenerationResponse =
        serde_json::from_str(body).map_err(|e| GenerationError::InvalidPayload(e.to_string()))?;
    response
        .results
        .into_iter()
        .next()
        .map(|result| result.generated_text)
        .ok_or_else(|| GenerationError::InvalidPayload("generation has no results".to_string()))
}

impl WatsonxGenerator {
    /// Create a client when both the API key and project id are available.
    pub fn from_config(
        config: &WatsonxConfig,
        timeout: Duration,
    ) -> Result<Option<Self>, GenerationError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty());
        let (Some(api_key), Some(project_id)) = (api_key, config.project_id.clone()) else {
            return Ok(None);
        };

        let http = Client::builder().timeout(timeout).build()?;
        Ok(Some(Self {
            service_url: config.service_url.trim_end_matches('/').to_string(),
            iam_url: config.iam_url.clone(),
            version: config.version.clone(),
            model: config.model.clone(),
            project_id,
            api_key,
            max_new_tokens: config.max_new_tokens,
            http,
            token: Mutex::new(None),
        }))
    }

    fn request_body(&self, role: &str, prompt: &str) -> serde_json::Value {
        serde_json::json!({
            "input": render_chat_template(role, prompt),
            "model_id": self.model,
            "project_id": self.project_id,
            "parameters": { "max_new_tokens": self.max_new_tokens },
        })
    }

    async fn bearer_token(&self) -> Result<String, GenerationError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.expires_at > Instant::now()) {
            return Ok(token.value.clone());
        }

        tracing::debug!("watsonx: requesting IAM token");
        let response = self
            .http
            .post(&self.iam_url)
            .form(&[
                ("grant_type", "urn:ibm:params:oauth:grant-type:apikey"),
                ("apikey", self.api_key.as_str()),
            ])
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
        let token: IamTokenResponse =
            serde_json::from_str(&body).map_err(|e| GenerationError::InvalidPayload(e.to_string()))?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_REFRESH_MARGIN);
        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(token.access_token)
    }
}

#[async_trait]
impl TextGenerator for WatsonxGenerator {
    async fn generate(&self, role: &str, prompt: &str) -> Result<String, GenerationError> {
        let token = self.bearer_token().await?;
        let url = format!(
            "{}/ml/v1/text/generation?version={}",
            self.service_url, self.version
        );
        tracing::debug!(model = %self.model, "watsonx: sending text generation");

        let response = self
            .http
            .post(url)
            .bearer_auth(token)
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
        parse_generation_response(&body)
    }

    fn name(&self) -> &str {
        "watsonx"
    }
}
