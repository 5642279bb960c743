//! OpenAI-compatible chat completion client.
//!
//! Works against api.openai.com or any endpoint speaking the same protocol
//! (set `base_url`). Only the non-streaming path exists; the orchestrator
//! treats generation as a single call-and-response.

use crate::error::EngineError;
use crate::llm::provider::{ChatMessage, CompletionParams, CompletionProvider};
use crate::utils::http::request_with_retry;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4";

#[derive(Debug, Clone, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

pub struct OpenAIClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAIClient {
    pub fn new(api_key: String, base_url: Option<String>, model: Option<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_key,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAIClient {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        params: Option<CompletionParams>,
    ) -> Result<String, EngineError> {
        let url = format!("{}/chat/completions", self.base_url);
        let opts = params.unwrap_or_default();
        let request_body = ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            stream: false,
            temperature: opts.temperature.or(Some(0.7)),
            max_tokens: opts.max_tokens,
            top_p: opts.top_p,
            stop: opts.stop,
        };

        let client = self.client.clone();
        let api_key = self.api_key.clone();
        let response = request_with_retry(
            move || {
                let client = client.clone();
                let url = url.clone();
                let body = request_body.clone();
                let api_key = api_key.clone();
                async move {
                    client
                        .post(&url)
                        .header("Authorization", format!("Bearer {}", api_key))
                        .header("Content-Type", "application/json")
                        .json(&body)
                        .send()
                        .await
                }
            },
            2,
        )
        .await
        .map_err(EngineError::Provider)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(EngineError::Provider(format!(
                "API error {}: {}",
                status, error_text
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| EngineError::Provider(format!("failed to parse response: {}", e)))?;

        match body["choices"][0]["message"]["content"].as_str() {
            Some(content) => Ok(content.to_string()),
            None => Err(EngineError::Provider(
                "response carried no message content".to_string(),
            )),
        }
    }

    fn id(&self) -> &str {
        "openai"
    }
}
