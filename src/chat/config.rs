//! Runtime configuration for a chat session.
//!
//! Configuration is layered: built-in defaults, then the persisted
//! settings file, then command line flags. Later layers win.

use arrrg_derive::CommandLine;

use crate::chat::settings::Settings;
use crate::prompts::PromptMode;
use crate::types::Model;

/// Command line options accepted by the chat binaries.
#[derive(CommandLine, Debug, Default, Eq, PartialEq)]
pub struct ChatArgs {
    /// Model identifier to use.
    #[arrrg(optional, "Model to chat with (default: phi3:mini).", "MODEL")]
    pub model: Option<String>,

    /// Base URL of the inference endpoint.
    #[arrrg(optional, "Endpoint base URL (default: http://localhost:11434/v1).", "URL")]
    pub endpoint: Option<String>,

    /// Response mode selecting the system prompt.
    #[arrrg(optional, "Response mode: default, quick, detailed, step-by-step.", "MODE")]
    pub mode: Option<String>,

    /// Retention window in user/assistant pairs.
    #[arrrg(optional, "User/assistant pairs to retain in context (default: 4).", "PAIRS")]
    pub memory: Option<usize>,

    /// Path of the settings file.
    #[arrrg(optional, "Settings file to load and save (default: tutor_settings.json).", "FILE")]
    pub settings: Option<String>,

    /// Disable ANSI styling on output.
    #[arrrg(flag, "Disable ANSI colors and styles.")]
    pub no_color: bool,
}

/// Resolved configuration the session engine runs with.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// The model every request names.
    pub model: Model,

    /// The response mode selecting the system prompt.
    pub mode: PromptMode,

    /// Retention window in user/assistant pairs.
    pub max_memory: usize,

    /// Default sampling temperature, persisted with the settings.
    pub default_temperature: f32,

    /// Base URL of the inference endpoint.
    pub endpoint: String,

    /// Whether renderers may emit ANSI styling.
    pub use_color: bool,
}

impl ChatConfig {
    /// Builds a configuration from persisted settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            model: settings.model.clone(),
            mode: PromptMode::default(),
            max_memory: settings.max_memory,
            default_temperature: settings.temperature,
            endpoint: settings.ollama_url.clone(),
            use_color: true,
        }
    }

    /// Overlays command line flags on top of this configuration.
    ///
    /// The mode string is validated by the caller before this point; an
    /// unparsable mode here silently keeps the current one.
    pub fn apply_args(mut self, args: &ChatArgs) -> Self {
        if let Some(model) = &args.model {
            self.model = Model::from(model.as_str());
        }
        if let Some(endpoint) = &args.endpoint {
            self.endpoint = endpoint.clone();
        }
        if let Some(mode) = &args.mode {
            if let Ok(mode) = mode.parse() {
                self.mode = mode;
            }
        }
        if let Some(memory) = args.memory {
            self.max_memory = memory;
        }
        if args.no_color {
            self.use_color = false;
        }
        self
    }

    /// Projects this configuration back into a persistable settings record.
    pub fn to_settings(&self) -> Settings {
        Settings {
            ollama_url: self.endpoint.clone(),
            model: self.model.clone(),
            max_memory: self.max_memory,
            temperature: self.default_temperature,
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}
