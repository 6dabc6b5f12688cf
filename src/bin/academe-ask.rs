//! One-shot question answering against a local Ollama endpoint.
//!
//! Asks a single question and streams the answer to stdout, then exits.
//! Useful for scripting and for piping answers into other tools.
//!
//! # Usage
//!
//! ```bash
//! academe-ask "solve 2x + 6 = 0"
//!
//! # Pick a model and skip ANSI styling for piping
//! academe-ask --model mistral --no-color "explain osmosis"
//! ```

use arrrg::CommandLine;

use academe::chat::{ChatArgs, ChatConfig, ChatSession, SETTINGS_FILE, Settings};
use academe::{Ollama, PlainTextRenderer, Renderer, TurnOutcome};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, free) = ChatArgs::from_command_line_relaxed("academe-ask [OPTIONS] <QUESTION>");
    let question = free.join(" ");
    if question.trim().is_empty() {
        eprintln!("usage: academe-ask [OPTIONS] <QUESTION>");
        std::process::exit(2);
    }

    let settings_path = args
        .settings
        .clone()
        .unwrap_or_else(|| SETTINGS_FILE.to_string());
    let settings = Settings::load(&settings_path);
    let config = ChatConfig::from_settings(&settings).apply_args(&args);
    let use_color = config.use_color;

    let client = Ollama::with_options(Some(config.endpoint.clone()), None)?;
    let mut renderer = PlainTextRenderer::with_color(use_color);
    if let Err(err) = client.check_connection().await {
        renderer.print_error(&err.to_string());
        std::process::exit(1);
    }

    let mut session = ChatSession::new(client, config);
    match session.send_streaming(&question, &mut renderer).await {
        Ok(TurnOutcome::Completed) => Ok(()),
        Ok(TurnOutcome::Interrupted) => std::process::exit(130),
        Err(err) => {
            renderer.print_error(&err.to_string());
            std::process::exit(1);
        }
    }
}
