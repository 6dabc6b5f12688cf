//! The session engine.
//!
//! A [`ChatSession`] owns the conversation state for one sitting: the
//! bounded memory window, session metadata, and the resolved
//! configuration. It is generic over the inference collaborator so the
//! interactive binaries and the tests drive the same engine.

use std::path::{Path, PathBuf};
use std::time::Instant;

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::accumulator::{AccumulatingAnswer, NO_RESPONSE, Snapshot};
use crate::chat::config::ChatConfig;
use crate::classifier::{GenParams, classify};
use crate::client::InferenceProvider;
use crate::error::{Error, Result};
use crate::memory::MemoryWindow;
use crate::observability::{
    SESSION_BATCH_QUESTIONS, SESSION_EXPORTS, SESSION_INTERRUPTS, SESSION_TURN_DURATION,
    SESSION_TURNS,
};
use crate::prompts::PromptMode;
use crate::render::Renderer;
use crate::types::{ChatRequest, ChatRole, Model, Turn};
use crate::utils;

/// Generation parameters for follow-up suggestion calls.
const FOLLOW_UP_PARAMS: GenParams = GenParams {
    temperature: 0.5,
    max_tokens: 60,
};

/// Longest answer prefix quoted back when asking for follow-ups.
const FOLLOW_UP_ANSWER_CHARS: usize = 200;

/// One timing sample recorded per completed turn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TurnSample {
    /// Wall-clock seconds from request build to finalization.
    pub seconds: f64,
    /// Characters in the raw answer.
    pub chars: usize,
}

/// Metadata accumulated over the life of a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionMetadata {
    /// When the session started.
    #[serde(with = "utils::time")]
    pub created: OffsetDateTime,

    /// User and assistant turns recorded, lifetime total; unlike the
    /// memory window this never shrinks under eviction.
    pub messages_count: u64,

    /// Per-turn timing samples, in completion order.
    pub performance: Vec<TurnSample>,
}

impl SessionMetadata {
    fn new() -> Self {
        Self {
            created: OffsetDateTime::now_utc(),
            messages_count: 0,
            performance: Vec::new(),
        }
    }
}

/// The exported conversation snapshot, serialized as a whole so a failed
/// export never produces a partial file.
#[derive(Serialize)]
struct ExportSnapshot<'a> {
    metadata: &'a SessionMetadata,
    conversation: &'a [Turn],
}

/// Where the engine is within the turn lifecycle.
///
/// A new submission is accepted only in `Idle`; anything else means a
/// turn is still in flight and the submission is rejected, not queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    Idle,
    BuildingRequest,
    Streaming,
    Finalizing,
}

/// How a streamed turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The answer was recorded in the conversation.
    Completed,
    /// The user interrupted; nothing was recorded.
    Interrupted,
}

/// A point-in-time statistics view for `/stats`.
#[derive(Debug, Clone)]
pub struct SessionStats {
    pub model: Model,
    pub mode: PromptMode,
    pub endpoint: String,
    pub window: usize,
    pub retained_turns: usize,
    pub messages_count: u64,
    pub average_seconds: Option<f64>,
    pub created: OffsetDateTime,
}

/// A chat session: conversation state plus the inference collaborator.
pub struct ChatSession<P: InferenceProvider> {
    provider: P,
    config: ChatConfig,
    memory: MemoryWindow,
    metadata: SessionMetadata,
    phase: TurnPhase,
}

impl<P: InferenceProvider> ChatSession<P> {
    /// Creates a session seeded with the configured mode's system prompt.
    pub fn new(provider: P, config: ChatConfig) -> Self {
        let memory = MemoryWindow::new(
            Turn::system(config.mode.system_prompt()),
            config.max_memory,
        );
        Self {
            provider,
            config,
            memory,
            metadata: SessionMetadata::new(),
            phase: TurnPhase::Idle,
        }
    }

    /// Returns the resolved configuration.
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Returns the retained conversation, system turn first.
    pub fn history(&self) -> &[Turn] {
        self.memory.turns()
    }

    /// Returns the current turn phase.
    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// Switches the model for subsequent requests. History is untouched.
    pub fn set_model(&mut self, model: Model) {
        self.config.model = model;
    }

    /// Switches the response mode.
    ///
    /// Only the system turn at position 0 is replaced; prior turns stay
    /// exactly as recorded.
    pub fn set_mode(&mut self, mode: PromptMode) {
        self.config.mode = mode;
        self.memory.set_system(Turn::system(mode.system_prompt()));
    }

    /// Streams one question through the provider and records the exchange.
    ///
    /// The renderer receives the text delta of every partial snapshot as
    /// it arrives. On normal completion both the user turn and the
    /// assistant turn enter the memory window and the window is trimmed;
    /// an interrupt discards the partial answer and records nothing. A
    /// failure before the stream is established also records nothing, so
    /// a failed turn can be retried verbatim.
    pub async fn send_streaming(
        &mut self,
        question: &str,
        renderer: &mut dyn Renderer,
    ) -> Result<TurnOutcome> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::validation("question must not be empty", None));
        }
        if self.phase != TurnPhase::Idle {
            return Err(Error::validation(
                "a turn is already in flight; wait for it to finish",
                None,
            ));
        }

        self.phase = TurnPhase::BuildingRequest;
        let (_, params) = classify(question);
        let mut messages = self.memory.turns().to_vec();
        messages.push(Turn::user(question));
        let request = ChatRequest::streaming(self.config.model.clone(), messages, params);

        self.phase = TurnPhase::Streaming;
        let started = Instant::now();
        let stream = match self.provider.stream_chat(request).await {
            Ok(stream) => stream,
            Err(err) => {
                self.phase = TurnPhase::Idle;
                return Err(err);
            }
        };

        let (mut answer, outcome_rx) = AccumulatingAnswer::new(stream);
        let mut seen = String::new();
        let mut final_text: Option<String> = None;
        let mut interrupted = false;
        while let Some(snapshot) = answer.next().await {
            if renderer.should_interrupt() {
                interrupted = true;
                break;
            }
            match snapshot {
                Snapshot::Partial(text) => {
                    renderer.print_text(&text[common_prefix(&text, &seen)..]);
                    seen = text;
                }
                Snapshot::Final(text) => {
                    renderer.print_text(&text[common_prefix(&text, &seen)..]);
                    final_text = Some(text);
                }
            }
        }
        if interrupted {
            // Dropping the undrained stream abandons the answer; the
            // outcome receiver observes cancellation.
            drop(answer);
            SESSION_INTERRUPTS.click();
            renderer.print_interrupted();
            self.phase = TurnPhase::Idle;
            return Ok(TurnOutcome::Interrupted);
        }
        debug_assert!(final_text.is_some());

        self.phase = TurnPhase::Finalizing;
        let outcome = match outcome_rx.await {
            Ok(outcome) => outcome,
            Err(_) => {
                self.phase = TurnPhase::Idle;
                return Err(Error::streaming("answer outcome was never delivered", None));
            }
        };

        let recorded = match &outcome.stream_error {
            Some(message) => format!("{}\n\n[stream error: {message}]", outcome.raw),
            None if outcome.raw.is_empty() => NO_RESPONSE.to_string(),
            None => outcome.raw.clone(),
        };
        self.memory.append(Turn::user(question));
        self.memory.append(Turn::assistant(recorded));
        self.memory.trim();

        let seconds = started.elapsed().as_secs_f64();
        self.metadata.messages_count += 2;
        self.metadata.performance.push(TurnSample {
            seconds,
            chars: outcome.raw.chars().count(),
        });
        SESSION_TURNS.click();
        SESSION_TURN_DURATION.add(seconds);

        renderer.finish_response();
        self.phase = TurnPhase::Idle;
        Ok(TurnOutcome::Completed)
    }

    /// Answers a list of questions independently and sequentially.
    ///
    /// Each question runs in a fresh context of just the system prompt
    /// and that question; the main conversation and metadata are never
    /// touched. Returns the raw answers in question order. A question
    /// whose request fails contributes an error note instead of halting
    /// the batch.
    pub async fn run_batch(
        &mut self,
        questions: &[String],
        renderer: &mut dyn Renderer,
    ) -> Result<Vec<String>> {
        if questions.is_empty() {
            return Err(Error::validation("batch contains no questions", None));
        }
        if self.phase != TurnPhase::Idle {
            return Err(Error::validation(
                "a turn is already in flight; wait for it to finish",
                None,
            ));
        }

        self.phase = TurnPhase::Streaming;
        let mut answers = Vec::with_capacity(questions.len());
        for (index, question) in questions.iter().enumerate() {
            if renderer.should_interrupt() {
                renderer.print_interrupted();
                break;
            }
            renderer.print_info(&format!(
                "[{}/{}] {question}",
                index + 1,
                questions.len()
            ));
            SESSION_BATCH_QUESTIONS.click();

            let (_, params) = classify(question);
            let messages = vec![
                Turn::system(self.config.mode.system_prompt()),
                Turn::user(question.clone()),
            ];
            let request = ChatRequest::streaming(self.config.model.clone(), messages, params);
            let stream = match self.provider.stream_chat(request).await {
                Ok(stream) => stream,
                Err(err) => {
                    renderer.print_error(&err.to_string());
                    answers.push(format!("[error: {err}]"));
                    continue;
                }
            };

            let (mut answer, outcome_rx) = AccumulatingAnswer::new(stream);
            let mut seen = String::new();
            while let Some(snapshot) = answer.next().await {
                let text = snapshot.text();
                renderer.print_text(&text[common_prefix(text, &seen)..]);
                seen = text.to_string();
            }
            renderer.finish_response();

            match outcome_rx.await {
                Ok(outcome) => {
                    let recorded = match &outcome.stream_error {
                        Some(message) => {
                            format!("{}\n\n[stream error: {message}]", outcome.raw)
                        }
                        None if outcome.raw.is_empty() => NO_RESPONSE.to_string(),
                        None => outcome.raw,
                    };
                    answers.push(recorded);
                }
                Err(_) => answers.push(NO_RESPONSE.to_string()),
            }
        }
        self.phase = TurnPhase::Idle;
        Ok(answers)
    }

    /// Asks the provider for follow-up questions to the last exchange.
    ///
    /// Uses a non-streaming call with its own fixed generation
    /// parameters. Fails with a validation error when no exchange has
    /// completed yet.
    pub async fn suggest_follow_ups(&self) -> Result<String> {
        let (question, answer) = self
            .last_exchange()
            .ok_or_else(|| Error::validation("no completed exchange to follow up on", None))?;
        let answer: String = answer.chars().take(FOLLOW_UP_ANSWER_CHARS).collect();
        let prompt = format!(
            "Based on this exchange:\nQ: {question}\nA: {answer}\n\n\
             Suggest 2 brief follow-up questions as a numbered list."
        );
        let request = ChatRequest::blocking(
            self.config.model.clone(),
            vec![Turn::user(prompt)],
            FOLLOW_UP_PARAMS,
        );
        self.provider.complete(request).await
    }

    fn last_exchange(&self) -> Option<(&str, &str)> {
        let turns = self.memory.turns();
        let assistant = turns
            .iter()
            .rposition(|turn| turn.role == ChatRole::Assistant)?;
        let user = turns[..assistant]
            .iter()
            .rposition(|turn| turn.role == ChatRole::User)?;
        Some((&turns[user].content, &turns[assistant].content))
    }

    /// Clears the conversation and lifetime counters.
    ///
    /// The system prompt for the current mode is re-seeded and the
    /// session creation time is preserved. Also releases a turn slot left
    /// occupied by a cancelled turn.
    pub fn clear(&mut self) {
        self.memory
            .reset(Turn::system(self.config.mode.system_prompt()));
        self.metadata.messages_count = 0;
        self.metadata.performance.clear();
        self.phase = TurnPhase::Idle;
    }

    /// Exports the conversation and metadata to a JSON file under `dir`.
    ///
    /// The file is named after the session creation time and written via
    /// a temporary file renamed into place, so a failed export leaves no
    /// partial file behind. Returns the path written.
    pub fn export_to_dir(&self, dir: &Path) -> Result<PathBuf> {
        let snapshot = ExportSnapshot {
            metadata: &self.metadata,
            conversation: self.memory.turns(),
        };
        let contents = serde_json::to_string_pretty(&snapshot).map_err(|err| {
            Error::serialization("failed to serialize export snapshot", Some(Box::new(err)))
        })?;

        let filename = format!(
            "chat_export_{}.json",
            utils::time::filename_slug(&self.metadata.created)
        );
        let path = dir.join(&filename);
        let tmp = dir.join(format!("{filename}.tmp"));
        std::fs::write(&tmp, contents)
            .map_err(|err| Error::io("failed to write export file", err))?;
        std::fs::rename(&tmp, &path)
            .map_err(|err| Error::io("failed to finalize export file", err))?;
        SESSION_EXPORTS.click();
        Ok(path)
    }

    /// Returns a statistics snapshot for display.
    pub fn stats(&self) -> SessionStats {
        let samples = &self.metadata.performance;
        let average_seconds = if samples.is_empty() {
            None
        } else {
            Some(samples.iter().map(|s| s.seconds).sum::<f64>() / samples.len() as f64)
        };
        SessionStats {
            model: self.config.model.clone(),
            mode: self.config.mode,
            endpoint: self.config.endpoint.clone(),
            window: self.memory.window(),
            retained_turns: self.memory.len(),
            messages_count: self.metadata.messages_count,
            average_seconds,
            created: self.metadata.created,
        }
    }
}

/// Length in bytes of the longest common prefix that ends on a char
/// boundary in both strings.
fn common_prefix(a: &str, b: &str) -> usize {
    let mut prefix = 0;
    for ((offset, ca), cb) in a.char_indices().zip(b.chars()) {
        if ca != cb {
            return offset;
        }
        prefix = offset + ca.len_utf8();
    }
    prefix
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use futures::stream;

    use crate::client::FragmentStream;
    use crate::types::KnownModel;

    /// Replays scripted fragment streams and records every request.
    struct ScriptedProvider {
        scripts: Mutex<VecDeque<Vec<Result<String>>>>,
        completions: Mutex<VecDeque<String>>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedProvider {
        fn new(scripts: Vec<Vec<Result<String>>>) -> Self {
            Self {
                scripts: Mutex::new(scripts.into()),
                completions: Mutex::new(VecDeque::new()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn answering(answers: &[&str]) -> Self {
            Self::new(
                answers
                    .iter()
                    .map(|a| vec![Ok(a.to_string())])
                    .collect(),
            )
        }

        fn with_completion(self, completion: &str) -> Self {
            self.completions
                .lock()
                .unwrap()
                .push_back(completion.to_string());
            self
        }

        fn requests(&self) -> Vec<ChatRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl InferenceProvider for ScriptedProvider {
        async fn stream_chat(&self, request: ChatRequest) -> Result<FragmentStream> {
            self.requests.lock().unwrap().push(request);
            let script = self
                .scripts
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| Error::connection("no scripted answer left", None))?;
            Ok(Box::pin(stream::iter(script)))
        }

        async fn complete(&self, request: ChatRequest) -> Result<String> {
            self.requests.lock().unwrap().push(request);
            self.completions
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| Error::connection("no scripted completion left", None))
        }
    }

    /// Captures rendered output for assertions.
    #[derive(Default)]
    struct CollectingRenderer {
        text: String,
        errors: Vec<String>,
        infos: Vec<String>,
        interrupted: bool,
        interrupt_requested: bool,
    }

    impl Renderer for CollectingRenderer {
        fn print_text(&mut self, text: &str) {
            self.text.push_str(text);
        }

        fn print_error(&mut self, error: &str) {
            self.errors.push(error.to_string());
        }

        fn print_info(&mut self, info: &str) {
            self.infos.push(info.to_string());
        }

        fn finish_response(&mut self) {}

        fn print_interrupted(&mut self) {
            self.interrupted = true;
        }

        fn should_interrupt(&self) -> bool {
            self.interrupt_requested
        }
    }

    fn config_with_window(window: usize) -> ChatConfig {
        ChatConfig {
            max_memory: window,
            ..ChatConfig::default()
        }
    }

    #[tokio::test]
    async fn five_turns_with_window_four_retain_nine() {
        let provider =
            ScriptedProvider::answering(&["a0", "a1", "a2", "a3", "a4"]);
        let mut session = ChatSession::new(provider, config_with_window(4));
        let mut renderer = CollectingRenderer::default();

        for i in 0..5 {
            let outcome = session
                .send_streaming(&format!("question {i}"), &mut renderer)
                .await
                .unwrap();
            assert_eq!(outcome, TurnOutcome::Completed);
        }

        let history = session.history();
        assert_eq!(history.len(), 9);
        assert!(history[0].is_system());
        // The oldest pair (question 0) was evicted.
        assert_eq!(history[1].content, "question 1");
        assert_eq!(history[8].content, "a4");
        assert_eq!(session.stats().messages_count, 10);
    }

    #[tokio::test]
    async fn streamed_deltas_reach_the_renderer() {
        let provider = ScriptedProvider::new(vec![vec![
            Ok("Hel".to_string()),
            Ok("lo, ".to_string()),
            Ok("world".to_string()),
        ]]);
        let mut session = ChatSession::new(provider, ChatConfig::default());
        let mut renderer = CollectingRenderer::default();

        session.send_streaming("greet me", &mut renderer).await.unwrap();
        assert!(renderer.text.starts_with("Hello, world"));
        assert!(renderer.text.contains("Verify all STEM answers"));
        // History records the raw answer, not the display markup.
        assert_eq!(session.history().last().unwrap().content, "Hello, world");
    }

    #[tokio::test]
    async fn empty_question_is_rejected() {
        let provider = ScriptedProvider::answering(&[]);
        let mut session = ChatSession::new(provider, ChatConfig::default());
        let mut renderer = CollectingRenderer::default();

        let err = session.send_streaming("   ", &mut renderer).await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(session.history().len(), 1);
    }

    #[tokio::test]
    async fn failed_request_leaves_history_unchanged() {
        // No scripts queued, so stream_chat fails before streaming.
        let provider = ScriptedProvider::new(Vec::new());
        let mut session = ChatSession::new(provider, ChatConfig::default());
        let mut renderer = CollectingRenderer::default();

        let err = session
            .send_streaming("what is entropy?", &mut renderer)
            .await
            .unwrap_err();
        assert!(err.is_connection());
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.phase(), TurnPhase::Idle);
        assert_eq!(session.stats().messages_count, 0);
    }

    #[tokio::test]
    async fn midstream_error_is_recorded_with_marker() {
        let provider = ScriptedProvider::new(vec![vec![
            Ok("partial answer".to_string()),
            Err(Error::streaming("connection reset", None)),
        ]]);
        let mut session = ChatSession::new(provider, ChatConfig::default());
        let mut renderer = CollectingRenderer::default();

        let outcome = session
            .send_streaming("what is entropy?", &mut renderer)
            .await
            .unwrap();
        assert_eq!(outcome, TurnOutcome::Completed);
        let recorded = &session.history().last().unwrap().content;
        assert!(recorded.starts_with("partial answer"));
        assert!(recorded.contains("[stream error:"));
    }

    #[tokio::test]
    async fn empty_stream_records_the_sentinel() {
        let provider = ScriptedProvider::new(vec![Vec::new()]);
        let mut session = ChatSession::new(provider, ChatConfig::default());
        let mut renderer = CollectingRenderer::default();

        session
            .send_streaming("anyone home?", &mut renderer)
            .await
            .unwrap();
        assert_eq!(session.history().last().unwrap().content, NO_RESPONSE);
    }

    #[tokio::test]
    async fn interrupt_discards_the_partial_answer() {
        let provider = ScriptedProvider::answering(&["never recorded"]);
        let mut session = ChatSession::new(provider, ChatConfig::default());
        let mut renderer = CollectingRenderer {
            interrupt_requested: true,
            ..CollectingRenderer::default()
        };

        let outcome = session
            .send_streaming("what is entropy?", &mut renderer)
            .await
            .unwrap();
        assert_eq!(outcome, TurnOutcome::Interrupted);
        assert!(renderer.interrupted);
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.stats().messages_count, 0);
        assert_eq!(session.phase(), TurnPhase::Idle);
    }

    #[tokio::test]
    async fn classification_selects_generation_parameters() {
        let provider = ScriptedProvider::answering(&["x = 2", "it flows"]);
        let mut session = ChatSession::new(provider, ChatConfig::default());
        let mut renderer = CollectingRenderer::default();

        session
            .send_streaming("solve x - 2 = 0", &mut renderer)
            .await
            .unwrap();
        session
            .send_streaming("what is a river?", &mut renderer)
            .await
            .unwrap();

        let requests = session.provider.requests();
        assert_eq!(requests[0].temperature, 0.2);
        assert_eq!(requests[0].max_tokens, 300);
        assert_eq!(requests[1].temperature, 0.3);
        assert_eq!(requests[1].max_tokens, 200);
    }

    #[tokio::test]
    async fn batch_runs_in_isolation() {
        let provider = ScriptedProvider::answering(&["seen before", "4", "osmosis"]);
        let mut session = ChatSession::new(provider, config_with_window(4));
        let mut renderer = CollectingRenderer::default();

        session
            .send_streaming("establish some history", &mut renderer)
            .await
            .unwrap();
        let before = session.history().to_vec();

        let answers = session
            .run_batch(
                &["what is 2+2?".to_string(), "define osmosis".to_string()],
                &mut renderer,
            )
            .await
            .unwrap();
        assert_eq!(answers, vec!["4".to_string(), "osmosis".to_string()]);

        // Main conversation and counters are untouched.
        assert_eq!(session.history(), &before[..]);
        assert_eq!(session.stats().messages_count, 2);

        // Each batch request carried only the system prompt and its own
        // question, never the prior history.
        let requests = session.provider.requests();
        for request in &requests[1..] {
            assert_eq!(request.messages.len(), 2);
            assert!(request.messages[0].is_system());
        }
    }

    #[tokio::test]
    async fn batch_continues_past_a_failed_question() {
        // Only one script queued for two questions: the second fails.
        let provider = ScriptedProvider::answering(&["4"]);
        let mut session = ChatSession::new(provider, ChatConfig::default());
        let mut renderer = CollectingRenderer::default();

        let answers = session
            .run_batch(
                &["what is 2+2?".to_string(), "define osmosis".to_string()],
                &mut renderer,
            )
            .await
            .unwrap();
        assert_eq!(answers.len(), 2);
        assert_eq!(answers[0], "4");
        assert!(answers[1].starts_with("[error:"));
        assert_eq!(renderer.errors.len(), 1);
    }

    #[tokio::test]
    async fn clear_reseeds_and_preserves_creation_time() {
        let provider = ScriptedProvider::answering(&["an answer"]);
        let mut session = ChatSession::new(provider, config_with_window(4));
        let mut renderer = CollectingRenderer::default();
        let created = session.stats().created;

        session
            .send_streaming("a question", &mut renderer)
            .await
            .unwrap();
        session.clear();

        assert_eq!(session.history().len(), 1);
        assert!(session.history()[0].is_system());
        let stats = session.stats();
        assert_eq!(stats.messages_count, 0);
        assert_eq!(stats.average_seconds, None);
        assert_eq!(stats.created, created);
    }

    #[tokio::test]
    async fn mode_switch_replaces_only_the_system_turn() {
        let provider = ScriptedProvider::answering(&["an answer"]);
        let mut session = ChatSession::new(provider, ChatConfig::default());
        let mut renderer = CollectingRenderer::default();

        session
            .send_streaming("a question", &mut renderer)
            .await
            .unwrap();
        session.set_mode(PromptMode::Quick);

        let history = session.history();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].content, PromptMode::Quick.system_prompt());
        assert_eq!(history[1].content, "a question");
        assert_eq!(history[2].content, "an answer");
    }

    #[tokio::test]
    async fn model_switch_applies_to_subsequent_requests() {
        let provider = ScriptedProvider::answering(&["one", "two"]);
        let mut session = ChatSession::new(provider, ChatConfig::default());
        let mut renderer = CollectingRenderer::default();

        session.send_streaming("first", &mut renderer).await.unwrap();
        session.set_model(Model::Known(KnownModel::Mistral));
        session.send_streaming("second", &mut renderer).await.unwrap();

        let requests = session.provider.requests();
        assert_eq!(requests[0].model, Model::Known(KnownModel::Phi3Mini));
        assert_eq!(requests[1].model, Model::Known(KnownModel::Mistral));
    }

    #[tokio::test]
    async fn follow_ups_quote_the_last_exchange() {
        let provider = ScriptedProvider::answering(&["entropy measures disorder"])
            .with_completion("1. What raises entropy?\n2. Is it reversible?");
        let mut session = ChatSession::new(provider, ChatConfig::default());
        let mut renderer = CollectingRenderer::default();

        session
            .send_streaming("define entropy briefly", &mut renderer)
            .await
            .unwrap();
        let suggestions = session.suggest_follow_ups().await.unwrap();
        assert!(suggestions.contains("What raises entropy?"));

        let requests = session.provider.requests();
        let follow_up = requests.last().unwrap();
        assert!(!follow_up.stream);
        assert_eq!(follow_up.temperature, 0.5);
        assert_eq!(follow_up.max_tokens, 60);
        assert_eq!(follow_up.messages.len(), 1);
        assert!(follow_up.messages[0].content.contains("define entropy briefly"));
        assert!(
            follow_up.messages[0]
                .content
                .contains("entropy measures disorder")
        );
    }

    #[tokio::test]
    async fn follow_ups_require_a_completed_exchange() {
        let provider = ScriptedProvider::new(Vec::new());
        let session = ChatSession::new(provider, ChatConfig::default());
        let err = session.suggest_follow_ups().await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn cancelled_turn_blocks_new_submissions_until_cleared() {
        // A stream that never yields keeps the turn in flight.
        let provider = PendingProvider;
        let mut session = ChatSession::new(provider, ChatConfig::default());
        let mut renderer = CollectingRenderer::default();

        {
            let fut = session.send_streaming("hangs forever", &mut renderer);
            futures::pin_mut!(fut);
            assert!(futures::poll!(fut.as_mut()).is_pending());
            // Dropping the future cancels the turn mid-flight.
        }

        let mut renderer = CollectingRenderer::default();
        let err = session
            .send_streaming("second question", &mut renderer)
            .await
            .unwrap_err();
        assert!(err.is_validation());

        session.clear();
        assert_eq!(session.phase(), TurnPhase::Idle);
    }

    struct PendingProvider;

    #[async_trait::async_trait]
    impl InferenceProvider for PendingProvider {
        async fn stream_chat(&self, _: ChatRequest) -> Result<FragmentStream> {
            Ok(Box::pin(stream::pending::<Result<String>>()))
        }

        async fn complete(&self, _: ChatRequest) -> Result<String> {
            Err(Error::connection("pending provider", None))
        }
    }

    #[tokio::test]
    async fn export_writes_a_complete_snapshot() {
        let provider = ScriptedProvider::answering(&["an answer"]);
        let mut session = ChatSession::new(provider, ChatConfig::default());
        let mut renderer = CollectingRenderer::default();
        session
            .send_streaming("a question", &mut renderer)
            .await
            .unwrap();

        let dir = std::env::temp_dir().join(format!("academe-export-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = session.export_to_dir(&dir).unwrap();
        assert!(
            path.file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("chat_export_")
        );

        let contents = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(value["metadata"]["messages_count"], 2);
        assert_eq!(value["conversation"].as_array().unwrap().len(), 3);
        assert_eq!(value["conversation"][1]["content"], "a question");
        let _ = std::fs::remove_dir_all(&dir);
    }
}
