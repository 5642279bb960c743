pub mod openai;
pub mod provider;

pub use openai::OpenAIClient;
pub use provider::{ChatMessage, CompletionParams, CompletionProvider};
