//! Interactive tutor chat against a local Ollama endpoint.
//!
//! This binary provides a streaming REPL for asking STEM questions of a
//! locally served model. Each question is classified to pick generation
//! parameters, recent history rides along under a bounded window, and
//! finished answers carry a verification footer.
//!
//! # Usage
//!
//! ```bash
//! # Basic usage with persisted settings
//! academe-chat
//!
//! # Specify a model
//! academe-chat --model llama3.2
//!
//! # Point at a different endpoint
//! academe-chat --endpoint http://127.0.0.1:11434/v1
//!
//! # Disable colors (useful for piping output)
//! academe-chat --no-color
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/help` - Show available commands
//! - `/clear` - Clear conversation history
//! - `/model <name>` - Change the model
//! - `/mode <mode>` - Change the response mode
//! - `/batch q1 ;; q2` - Answer independent questions in sequence
//! - `/export` - Export the conversation to JSON
//! - `/quit` - Exit the application

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use academe::chat::{
    ChatArgs, ChatCommand, ChatConfig, ChatSession, SETTINGS_FILE, Settings, help_text,
    parse_command,
};
use academe::{Model, Ollama, PlainTextRenderer, Renderer};

/// Main entry point for the academe-chat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("academe-chat [OPTIONS]");
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
    let mut rl = DefaultEditor::new()?;

    // Flag for interrupt handling during streaming
    let interrupted = Arc::new(AtomicBool::new(false));
    renderer = renderer.with_interrupt(interrupted.clone());

    // Set up Ctrl+C handler
    let interrupted_clone = interrupted.clone();
    ctrlc::set_handler(move || {
        interrupted_clone.store(true, Ordering::Relaxed);
    })?;

    println!("Academe (model: {})", session.config().model);
    println!("Type /help for commands, /quit to exit\n");

    loop {
        // Reset interrupt flag before each input
        interrupted.store(false, Ordering::Relaxed);

        let readline = rl.readline("You: ");

        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                // Check for slash commands
                if let Some(cmd) = parse_command(line) {
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::History => {
                            print_history(&session);
                        }
                        ChatCommand::Clear => {
                            session.clear();
                            renderer.print_info("Conversation cleared.");
                        }
                        ChatCommand::Export => match session.export_to_dir(Path::new(".")) {
                            Ok(path) => renderer
                                .print_info(&format!("Conversation exported to {}", path.display())),
                            Err(err) => {
                                renderer.print_error(&format!("Export failed: {}", err))
                            }
                        },
                        ChatCommand::Model(model_name) => {
                            session.set_model(Model::from(model_name.as_str()));
                            renderer.print_info(&format!("Model changed to: {}", model_name));
                        }
                        ChatCommand::Mode(mode) => {
                            session.set_mode(mode);
                            renderer.print_info(&format!("Response mode set to: {}", mode));
                        }
                        ChatCommand::Batch(questions) => {
                            if let Err(err) = session.run_batch(&questions, &mut renderer).await {
                                renderer.print_error(&err.to_string());
                            }
                        }
                        ChatCommand::FollowUps => match session.suggest_follow_ups().await {
                            Ok(suggestions) => {
                                renderer.print_info("Follow-up suggestions:");
                                println!("{}", suggestions);
                            }
                            Err(err) => renderer.print_error(&err.to_string()),
                        },
                        ChatCommand::Settings => {
                            print_settings(&session, &settings_path);
                        }
                        ChatCommand::SaveSettings => {
                            match session.config().to_settings().save(&settings_path) {
                                Ok(()) => renderer
                                    .print_info(&format!("Settings saved to {}", settings_path)),
                                Err(err) => renderer
                                    .print_error(&format!("Failed to save settings: {}", err)),
                            }
                        }
                        ChatCommand::Stats => {
                            print_stats(&session);
                        }
                        ChatCommand::Invalid(message) => {
                            renderer.print_error(&message);
                        }
                    }
                    continue;
                }

                // Regular question - stream the answer
                println!("Tutor:");
                if let Err(e) = session.send_streaming(line, &mut renderer).await {
                    renderer.print_error(&e.to_string());
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D - exit
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

fn print_history(session: &ChatSession<Ollama>) {
    let turns: Vec<_> = session
        .history()
        .iter()
        .filter(|turn| !turn.is_system())
        .collect();
    if turns.is_empty() {
        println!("    (no conversation yet)");
        return;
    }
    for turn in turns {
        println!("    [{}] {}", turn.role, turn.content);
    }
}

fn print_settings(session: &ChatSession<Ollama>, settings_path: &str) {
    let settings = session.config().to_settings();
    println!("    Active settings ({}):", settings_path);
    println!("      Endpoint: {}", settings.ollama_url);
    println!("      Model: {}", settings.model);
    println!("      Memory window: {} pairs", settings.max_memory);
    println!("      Default temperature: {:.2}", settings.temperature);
    println!("    Use /settings save to persist them.");
}

fn print_stats(session: &ChatSession<Ollama>) {
    let stats = session.stats();
    println!("    Session Statistics:");
    println!("      Model: {}", stats.model);
    println!("      Mode: {}", stats.mode);
    println!("      Endpoint: {}", stats.endpoint);
    println!("      Memory window: {} pairs", stats.window);
    println!("      Turns in context: {}", stats.retained_turns);
    println!("      Messages this session: {}", stats.messages_count);
    match stats.average_seconds {
        Some(avg) => println!("      Average answer time: {:.2}s", avg),
        None => println!("      Average answer time: (no turns yet)"),
    }
}
