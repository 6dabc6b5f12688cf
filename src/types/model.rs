use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Represents a model identifier on the local inference endpoint.
///
/// This can be one of the models the tutor ships defaults for, or a
/// custom string for any other model pulled into Ollama.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Model {
    /// Known model identifiers.
    Known(KnownModel),

    /// Custom model identifier.
    Custom(String),
}

/// Known local model identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KnownModel {
    /// Phi-3 mini, the default tutor model.
    #[serde(rename = "phi3:mini")]
    Phi3Mini,

    /// Llama 3.2.
    #[serde(rename = "llama3.2")]
    Llama32,

    /// Mistral 7B.
    #[serde(rename = "mistral")]
    Mistral,
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Model::Known(known) => write!(f, "{}", known),
            Model::Custom(custom) => write!(f, "{}", custom),
        }
    }
}

impl fmt::Display for KnownModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KnownModel::Phi3Mini => write!(f, "phi3:mini"),
            KnownModel::Llama32 => write!(f, "llama3.2"),
            KnownModel::Mistral => write!(f, "mistral"),
        }
    }
}

impl FromStr for Model {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "phi3:mini" => Model::Known(KnownModel::Phi3Mini),
            "llama3.2" => Model::Known(KnownModel::Llama32),
            "mistral" => Model::Known(KnownModel::Mistral),
            other => Model::Custom(other.to_string()),
        })
    }
}

impl From<&str> for Model {
    fn from(s: &str) -> Self {
        s.parse().expect("model parsing is infallible")
    }
}
