use serde_json::{Value, json};
use thiserror::Error;

use super::context::compose_prompt;
use crate::config::AppConfig;

pub const NO_REPLY: &str = "no reply content";

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("message must not be empty")]
    Validation,
    #[error("API key not configured")]
    Configuration,
    #[error("API Error: {0}")]
    Api(String),
    #[error("API request failed: {0}")]
    Transport(String),
}

/// Client for the Gemini `generateContent` endpoint.
///
/// Every call is one fresh request: nothing is retried or cached.
#[derive(Debug, Clone)]
pub struct AssistantClient {
    http: reqwest::Client,
    api_url: String,
    model: String,
    api_key: Option<String>,
    temperature: f64,
    max_output_tokens: u32,
}

impl AssistantClient {
    pub fn new(config: &AppConfig, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", self.api_url, self.model)
    }

    fn request_body(&self, text: &str) -> Value {
        json!({
            "contents": [{
                "parts": [{ "text": text }]
            }],
            "generationConfig": {
                "temperature": self.temperature,
                "maxOutputTokens": self.max_output_tokens
            }
        })
    }

    /// Ask the model about `message`, with `context` describing the user's
    /// current tasks and notes. Returns the reply text untouched.
    pub async fn send_chat(&self, message: &str, context: &str) -> Result<String, AssistantError> {
        let api_key = self.api_key.as_deref().ok_or(AssistantError::Configuration)?;
        let body = self.request_body(&compose_prompt(context, message));

        log::debug!("Sending chat request to {} ({} chars)", self.model, message.len());

        let resp = self
            .http
            .post(self.endpoint())
            .query(&[("key", api_key)])
            .header("x-goog-api-key", api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AssistantError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            // An unreadable error body still reports the status.
            let text = resp.text().await.unwrap_or_default();
            let message = error_message(status.as_u16(), &text);
            log::warn!("Chat request failed with {}: {}", status, message);
            return Err(AssistantError::Api(message));
        }

        let text = resp
            .text()
            .await
            .map_err(|e| AssistantError::Transport(e.to_string()))?;

        let payload: Value = serde_json::from_str(&text)
            .map_err(|e| AssistantError::Api(format!("invalid response body: {}", e)))?;
        extract_reply(&payload)
    }

    /// Verify the configured key with a minimal request.
    pub async fn test_api_key(&self) -> Result<(), AssistantError> {
        self.send_chat("Reply with OK", "").await.map(|_| ())
    }
}

/// The server's own error text if the body carries one, else the status.
fn error_message(status: u16, body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|v| {
            v["error"]["message"]
                .as_str()
                .or_else(|| v["message"].as_str())
        })
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status))
}

fn extract_reply(payload: &Value) -> Result<String, AssistantError> {
    let candidate = payload["candidates"]
        .as_array()
        .and_then(|arr| arr.first())
        .ok_or_else(|| AssistantError::Api(format!("{}: no candidates in response", NO_REPLY)))?;

    candidate["content"]["parts"]
        .as_array()
        .and_then(|parts| parts.first())
        .and_then(|part| part["text"].as_str())
        .filter(|text| !text.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AssistantError::Api(NO_REPLY.to_string()))
}
