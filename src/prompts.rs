//! System prompt variants.
//!
//! Switching the response mode only changes which variant sits at
//! position 0 of the conversation for subsequent turns; history is never
//! rewritten.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The default instruction prompt: correct, terse, no filler.
const DEFAULT_PROMPT: &str = "\
You are a local inference-only language model running via Ollama.

OBJECTIVE
Produce correct answers with the minimum number of tokens required.

HARD CONSTRAINTS
- Answer directly. No introductions, conclusions, or meta commentary.
- Never repeat the user's question.
- Never explain unless explicitly asked to explain.
- Never speculate. If information is missing, reply exactly: \"I don't know.\"
- Never add safety notes, disclaimers, or opinions.
- No emojis. No personality. No conversational filler.

RESPONSE LENGTH POLICY
- Default: 1-5 sentences.
- Use longer responses ONLY when the user explicitly requests detail.
- Prefer short declarative sentences.
- Do not restate known context.

REASONING POLICY
- Do NOT reveal chain-of-thought.
- Show steps ONLY for:
  - mathematics
  - formal logic
  - programming or debugging
- Otherwise, give conclusions only.

FORMAT RULES
- Plain text by default.
- Use markdown only when strictly necessary for clarity.
- No headers unless explicitly requested.
- Code only in code blocks.

EFFICIENCY RULES
- Avoid redundancy.
- Avoid paraphrasing the same idea.
- Choose the most precise wording possible.
- Stop generation immediately once the answer is complete.

ROLE
You are an academic and technical assistant.
Your priorities are correctness, precision, and speed.
";

/// The detailed variant: comprehensive, structured explanations.
const DETAILED_PROMPT: &str = "\
You are an educational assistant providing comprehensive explanations.
- Break complex topics into steps
- Use clear, structured formatting
- Include examples when helpful
- Explain the \"why\" behind concepts
- Provide detailed rationale and context where appropriate.
";

/// The quick variant: essential answer only.
const QUICK_PROMPT: &str = "\
Answer quickly and concisely.
- Provide only the essential answer
- Minimize explanation unless asked
- Use short sentences
- Get to the point immediately
- Limit your responses to the absolute minimum necessary words.
";

/// The selectable response mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PromptMode {
    /// Balanced default behavior.
    #[default]
    Default,

    /// Essential answer only, minimal words.
    Quick,

    /// Comprehensive, structured explanations.
    Detailed,

    /// Show working for math and logic. Uses the detailed variant.
    StepByStep,
}

impl PromptMode {
    /// Returns the system prompt for this mode.
    pub fn system_prompt(self) -> &'static str {
        match self {
            PromptMode::Default => DEFAULT_PROMPT,
            PromptMode::Quick => QUICK_PROMPT,
            PromptMode::Detailed | PromptMode::StepByStep => DETAILED_PROMPT,
        }
    }
}

impl fmt::Display for PromptMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptMode::Default => write!(f, "default"),
            PromptMode::Quick => write!(f, "quick"),
            PromptMode::Detailed => write!(f, "detailed"),
            PromptMode::StepByStep => write!(f, "step-by-step"),
        }
    }
}

impl FromStr for PromptMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "default" => Ok(PromptMode::Default),
            "quick" | "fast" => Ok(PromptMode::Quick),
            "detailed" => Ok(PromptMode::Detailed),
            "step-by-step" | "steps" => Ok(PromptMode::StepByStep),
            other => Err(format!(
                "unknown mode '{other}' (use default, quick, detailed, or step-by-step)"
            )),
        }
    }
}
