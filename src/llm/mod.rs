pub mod gemini;
pub mod stream;

use serde::{Deserialize, Serialize};

/// One prior turn replayed as request context.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// A web source backing a grounded response.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Citation {
    pub uri: String,
    pub title: String,
}

/// One increment of a streamed model response. Any combination of the
/// fields may be present on a single chunk.
#[derive(Debug, Clone, Default)]
pub struct StreamChunk {
    pub text: Option<String>,
    pub thought: Option<String>,
    pub citations: Vec<Citation>,
}

/// Request-level options mapped onto the wire config block.
#[derive(Debug, Clone, Default)]
pub struct GenerationOptions {
    pub system_instruction: Option<String>,
    pub grounding: bool,
    pub thinking_budget: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GenerateRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Parse error: {0}")]
    Parse(String),
}

impl Serialize for LlmError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
