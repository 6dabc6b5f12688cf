use serde::Deserialize;

/// A complete, non-streaming chat completion response.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletion {
    /// Identifier assigned by the endpoint.
    #[serde(default)]
    pub id: Option<String>,

    /// The model that produced this response.
    #[serde(default)]
    pub model: Option<String>,

    /// Completed choices; the endpoint sends one.
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
}

/// One completed choice.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionChoice {
    /// Position of this choice in the response.
    #[serde(default)]
    pub index: u32,

    /// The full message for this choice.
    pub message: CompletionMessage,

    /// Why generation stopped.
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// The message body of a completed choice.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionMessage {
    /// Role of the message, always assistant in practice.
    #[serde(default)]
    pub role: Option<String>,

    /// The generated text.
    #[serde(default)]
    pub content: String,
}

impl ChatCompletion {
    /// Returns the generated text of the first choice, if any.
    pub fn text(&self) -> Option<&str> {
        self.choices.first().map(|choice| choice.message.content.as_str())
    }
}
