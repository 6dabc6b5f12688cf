//! Type definitions for the academe client.

mod chunk;
mod model;
mod request;
mod response;
mod turn;

pub use chunk::{ChatCompletionChunk, ChunkChoice, ChunkDelta};
pub use model::{KnownModel, Model};
pub use request::ChatRequest;
pub use response::{ChatCompletion, CompletionChoice, CompletionMessage};
pub use turn::{ChatRole, Turn};
