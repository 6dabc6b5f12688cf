//! Interactive chat: configuration, commands, settings, and the session
//! engine shared by the chat binaries.

pub mod commands;
pub mod config;
pub mod session;
pub mod settings;

pub use commands::{BATCH_SEPARATOR, ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig};
pub use session::{ChatSession, SessionMetadata, SessionStats, TurnOutcome, TurnPhase, TurnSample};
pub use settings::{SETTINGS_FILE, Settings};
