use serde::Serialize;

use crate::classifier::GenParams;
use crate::types::{Model, Turn};

/// Parameters for a chat completion request against the local endpoint.
///
/// The field names follow the OpenAI-compatible wire format that Ollama
/// serves at `/v1/chat/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// The model to generate with.
    pub model: Model,

    /// The ordered message set: system turn, retained history, new user turn.
    pub messages: Vec<Turn>,

    /// Whether to stream the response token by token.
    pub stream: bool,

    /// Sampling temperature.
    pub temperature: f32,

    /// Cap on generated tokens.
    pub max_tokens: u32,
}

impl ChatRequest {
    /// Creates a streaming request with the given generation parameters.
    pub fn streaming(model: Model, messages: Vec<Turn>, params: GenParams) -> Self {
        Self {
            model,
            messages,
            stream: true,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        }
    }

    /// Creates a non-streaming request with the given generation parameters.
    pub fn blocking(model: Model, messages: Vec<Turn>, params: GenParams) -> Self {
        Self {
            stream: false,
            ..Self::streaming(model, messages, params)
        }
    }
}
