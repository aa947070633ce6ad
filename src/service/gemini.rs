use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::config::EngineConfig;
use crate::error::{with_timeout, AppError, Result};
use crate::service::http::{create_client, ClientType};

const SERVICE: &str = "gemini";

/// A text generation backend.
///
/// `instruction` sets tone and role; `prompt` carries the page facts and the
/// requested output shape. Implementations return the raw generated text.
#[async_trait]
pub trait GenerativeProvider: Send + Sync {
    async fn generate(&self, instruction: &str, prompt: &str) -> Result<String>;
}

/// Run one `generate` call on its own task, bounded by `limit`.
///
/// A provider that panics surfaces as a `ServiceError` here instead of
/// unwinding through the caller, so callers keep their fallback path.
pub async fn generate_isolated(
    provider: &Arc<dyn GenerativeProvider>,
    instruction: &str,
    prompt: String,
    limit: Duration,
) -> Result<String> {
    let provider = Arc::clone(provider);
    let instruction = instruction.to_string();
    let task = tokio::spawn(async move {
        with_timeout(SERVICE, limit, provider.generate(&instruction, &prompt)).await
    });

    match task.await {
        Ok(outcome) => outcome,
        Err(e) => Err(AppError::service(SERVICE, format!("provider task failed: {e}"))),
    }
}

/// Google Gemini `generateContent` client.
pub struct GeminiClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: &EngineConfig, api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: create_client(ClientType::Api, &config.user_agent, config.generative_timeout)?,
            endpoint: config.gemini_endpoint.trim_end_matches('/').to_string(),
            model: config.gemini_model.clone(),
            api_key: api_key.into(),
        })
    }

    /// `None` when no API key is configured.
    pub fn from_config(config: &EngineConfig) -> Result<Option<Self>> {
        match &config.gemini_api_key {
            Some(key) => Ok(Some(Self::new(config, key.clone())?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl GenerativeProvider for GeminiClient {
    async fn generate(&self, instruction: &str, prompt: &str) -> Result<String> {
        let api_url = format!("{}/models/{}:generateContent", self.endpoint, self.model);

        let request_body = json!({
            "systemInstruction": {
                "parts": [{ "text": instruction }]
            },
            "contents": [{
                "parts": [{ "text": prompt }]
            }],
            "generationConfig": {
                "responseMimeType": "application/json"
            }
        });

        let response = self
            .client
            .post(&api_url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request_body)
            .send()
            .await
            .map_err(|e| AppError::service(SERVICE, format!("Failed to send request: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::service(
                SERVICE,
                format!("API error {}: {}", status, error_text.chars().take(200).collect::<String>()),
            ));
        }

        let response_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AppError::service(SERVICE, format!("Failed to parse response: {e}")))?;

        let text = response_json["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| AppError::service(SERVICE, "Failed to extract text from response"))?
            .to_string();

        Ok(text)
    }
}

/// Strip a surrounding markdown fence (```json ... ```) if present.
pub fn strip_code_fence(output: &str) -> &str {
    let trimmed = output.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // drop the info string (e.g. "json") up to the first newline
    let body = match rest.find('\n') {
        Some(i) => &rest[i + 1..],
        None => rest,
    };
    match body.rfind("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}
