//! Completion provider trait — common interface for text-generation backends.

use crate::error::EngineError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One turn of conversation context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

// ── Common parameters ──────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct CompletionParams {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
    pub stop: Option<Vec<String>>,
}

/// Opaque text-generation seam. Failures collapse into
/// `EngineError::Provider`; the orchestrator substitutes a fallback reply.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Non-streaming chat completion.
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        params: Option<CompletionParams>,
    ) -> Result<String, EngineError>;

    /// Provider identifier (e.g. "openai").
    fn id(&self) -> &str;
}
