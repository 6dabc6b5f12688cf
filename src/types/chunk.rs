use serde::Deserialize;

/// One server-sent chunk of a streaming chat completion.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionChunk {
    /// Identifier assigned by the endpoint.
    #[serde(default)]
    pub id: Option<String>,

    /// The model that produced this chunk.
    #[serde(default)]
    pub model: Option<String>,

    /// Incremental choices; the endpoint sends one per chunk.
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

/// One choice within a streaming chunk.
#[derive(Debug, Clone, Deserialize)]
pub struct ChunkChoice {
    /// Position of this choice in the response.
    #[serde(default)]
    pub index: u32,

    /// The incremental delta for this choice.
    pub delta: ChunkDelta,

    /// Why generation stopped, set on the terminal chunk.
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// The incremental content of a streaming chunk.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkDelta {
    /// Role, sent on the first chunk only.
    #[serde(default)]
    pub role: Option<String>,

    /// The text fragment, absent on role-only and terminal chunks.
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionChunk {
    /// Returns the text fragment carried by this chunk, if any.
    pub fn fragment(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.delta.content.as_deref())
            .filter(|content| !content.is_empty())
    }
}
