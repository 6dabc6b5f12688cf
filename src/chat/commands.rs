//! Slash-command parsing for the interactive chat loop.
//!
//! Any input starting with `/` is a command; everything else is a
//! question for the session engine. `exit` and `quit` work bare as a
//! courtesy.

use crate::prompts::PromptMode;

/// Separator between questions in a `/batch` payload.
pub const BATCH_SEPARATOR: &str = ";;";

/// Commands that can be entered during a chat session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Show help text (`/help`).
    Help,
    /// Show recent conversation history (`/history`).
    History,
    /// Clear the conversation, keeping the system prompt (`/clear`).
    Clear,
    /// Export the conversation to a JSON file (`/export`).
    Export,
    /// Switch to a different model (`/model <name>`).
    Model(String),
    /// Switch the response mode (`/mode <mode>`).
    Mode(PromptMode),
    /// Answer several questions in isolation (`/batch q1 ;; q2`).
    Batch(Vec<String>),
    /// Suggest follow-up questions to the last exchange (`/followups`).
    FollowUps,
    /// Show the active settings (`/settings`).
    Settings,
    /// Persist the active settings (`/settings save`).
    SaveSettings,
    /// Show session statistics (`/stats`).
    Stats,
    /// End the session (`/quit`, bare `exit` or `quit`).
    Quit,
    /// An unrecognized or malformed command, with a hint to print.
    Invalid(String),
}

/// Parses one line of input into a command, or `None` for a question.
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return match trimmed.to_lowercase().as_str() {
            "exit" | "quit" | "q" => Some(ChatCommand::Quit),
            _ => None,
        };
    }

    let (command, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (trimmed, ""),
    };

    Some(match command.to_lowercase().as_str() {
        "/help" | "/?" => ChatCommand::Help,
        "/history" => ChatCommand::History,
        "/clear" => ChatCommand::Clear,
        "/export" => ChatCommand::Export,
        "/model" => {
            if rest.is_empty() {
                ChatCommand::Invalid("usage: /model <name>".to_string())
            } else {
                ChatCommand::Model(rest.to_string())
            }
        }
        "/mode" => match rest.parse::<PromptMode>() {
            Ok(mode) => ChatCommand::Mode(mode),
            Err(err) => ChatCommand::Invalid(format!("usage: /mode <mode>: {err}")),
        },
        "/batch" => {
            let questions: Vec<String> = rest
                .split(BATCH_SEPARATOR)
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(String::from)
                .collect();
            if questions.is_empty() {
                ChatCommand::Invalid(format!(
                    "usage: /batch <q1> {BATCH_SEPARATOR} <q2> {BATCH_SEPARATOR} ..."
                ))
            } else {
                ChatCommand::Batch(questions)
            }
        }
        "/followups" | "/followup" => ChatCommand::FollowUps,
        "/settings" => match rest.to_lowercase().as_str() {
            "" => ChatCommand::Settings,
            "save" => ChatCommand::SaveSettings,
            _ => ChatCommand::Invalid("usage: /settings [save]".to_string()),
        },
        "/stats" => ChatCommand::Stats,
        "/quit" | "/exit" | "/q" => ChatCommand::Quit,
        other => ChatCommand::Invalid(format!("unknown command {other}; try /help")),
    })
}

/// Help text listing the command surface.
pub fn help_text() -> &'static str {
    "Commands:
  /help              Show this help
  /history           Show recent conversation history
  /clear             Clear the conversation (keeps the system prompt)
  /export            Export the conversation to a JSON file
  /model <name>      Switch models
  /mode <mode>       Switch response mode (default, quick, detailed, step-by-step)
  /batch q1 ;; q2    Answer several independent questions in sequence
  /followups         Suggest follow-up questions to the last exchange
  /settings [save]   Show the active settings, or persist them
  /stats             Show session statistics
  /quit              End the session (or just type exit)"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_not_a_command() {
        assert_eq!(parse_command("what is entropy?"), None);
        assert_eq!(parse_command("  solve x^2 = 4  "), None);
    }

    #[test]
    fn bare_exit_words_quit() {
        assert_eq!(parse_command("exit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("QUIT"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("q"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("quite the question"), None);
    }

    #[test]
    fn simple_commands_parse() {
        assert_eq!(parse_command("/help"), Some(ChatCommand::Help));
        assert_eq!(parse_command("/history"), Some(ChatCommand::History));
        assert_eq!(parse_command("/clear"), Some(ChatCommand::Clear));
        assert_eq!(parse_command("/export"), Some(ChatCommand::Export));
        assert_eq!(parse_command("/stats"), Some(ChatCommand::Stats));
        assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/q"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/?"), Some(ChatCommand::Help));
    }

    #[test]
    fn model_requires_an_argument() {
        assert_eq!(
            parse_command("/model llama3.2"),
            Some(ChatCommand::Model("llama3.2".to_string()))
        );
        assert!(matches!(
            parse_command("/model"),
            Some(ChatCommand::Invalid(_))
        ));
    }

    #[test]
    fn mode_parses_and_validates() {
        assert_eq!(
            parse_command("/mode detailed"),
            Some(ChatCommand::Mode(PromptMode::Detailed))
        );
        assert!(matches!(
            parse_command("/mode verbose"),
            Some(ChatCommand::Invalid(_))
        ));
    }

    #[test]
    fn batch_splits_on_separator() {
        assert_eq!(
            parse_command("/batch what is 2+2? ;; define osmosis ;; "),
            Some(ChatCommand::Batch(vec![
                "what is 2+2?".to_string(),
                "define osmosis".to_string(),
            ]))
        );
        assert!(matches!(
            parse_command("/batch"),
            Some(ChatCommand::Invalid(_))
        ));
        assert!(matches!(
            parse_command("/batch ;; ;;"),
            Some(ChatCommand::Invalid(_))
        ));
    }

    #[test]
    fn settings_save_is_distinct() {
        assert_eq!(parse_command("/settings"), Some(ChatCommand::Settings));
        assert_eq!(
            parse_command("/settings save"),
            Some(ChatCommand::SaveSettings)
        );
        assert!(matches!(
            parse_command("/settings reset"),
            Some(ChatCommand::Invalid(_))
        ));
    }

    #[test]
    fn unknown_command_is_invalid() {
        assert!(matches!(
            parse_command("/frobnicate"),
            Some(ChatCommand::Invalid(_))
        ));
    }
}
