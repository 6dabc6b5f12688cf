//! A terminal STEM tutor backed by a local OpenAI-compatible endpoint.
//!
//! The library half of the crate: question classification, bounded
//! conversation memory, streaming answer accumulation, and the session
//! engine that ties them to an inference provider.

// Public modules
pub mod accumulator;
pub mod chat;
pub mod classifier;
pub mod client;
pub mod error;
pub mod memory;
pub mod observability;
pub mod prompts;
pub mod render;
pub mod sse;
pub mod types;
pub mod utils;

// Re-exports
pub use accumulator::{AccumulatingAnswer, AnswerOutcome, NO_RESPONSE, Snapshot};
pub use chat::{ChatConfig, ChatSession, Settings, TurnOutcome};
pub use classifier::{GenParams, QueryLabel, classify};
pub use client::{FragmentStream, InferenceProvider, Ollama};
pub use error::{Error, Result};
pub use memory::MemoryWindow;
pub use prompts::PromptMode;
pub use render::{PlainTextRenderer, Renderer};
pub use types::*;
