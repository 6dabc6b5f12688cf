//! Accumulates streaming answer fragments into a complete response while
//! passing partial snapshots through.
//!
//! The session engine drives this stream to surface live progress to the
//! UI; the full, unformatted answer is delivered over a oneshot channel
//! once the fragment source is exhausted, so the engine can record it in
//! the conversation without re-buffering.

use std::pin::Pin;

use futures::Stream;

use crate::error::{Error, Result};

/// Sentinel yielded when the fragment source produced nothing at all.
pub const NO_RESPONSE: &str = "No response";

/// Footer appended to every finalized answer.
const VERIFY_FOOTER: &str =
    "\n\n---\n*Verify all STEM answers from an authoritative source before using them.*";

/// One snapshot of the answer under accumulation.
///
/// Every fragment produces a `Partial` holding the full buffer so far,
/// not just the delta; consumers that want the delta diff against the
/// previous snapshot. The sequence always ends with exactly one `Final`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Snapshot {
    /// The buffer after the latest fragment.
    Partial(String),

    /// The finalized answer: code blocks marked up and the verification
    /// footer appended, or the no-response sentinel, or the partial
    /// buffer with an error marker when the source failed mid-stream.
    Final(String),
}

impl Snapshot {
    /// The text carried by this snapshot.
    pub fn text(&self) -> &str {
        match self {
            Snapshot::Partial(text) | Snapshot::Final(text) => text,
        }
    }

    /// Returns true for the terminal snapshot.
    pub fn is_final(&self) -> bool {
        matches!(self, Snapshot::Final(_))
    }
}

/// The accumulated result of a drained fragment stream.
#[derive(Debug, Clone)]
pub struct AnswerOutcome {
    /// The raw accumulated text, without finalization markup. Empty if
    /// the source produced no fragments.
    pub raw: String,

    /// Present when the source signaled an error mid-stream; `raw` then
    /// holds whatever partial content arrived before the failure.
    pub stream_error: Option<String>,
}

/// A stream wrapper that accumulates text fragments into a full answer.
///
/// Wraps a fragment stream and yields a [`Snapshot`] per fragment, then a
/// single finalized snapshot. Finite and not restartable. The wrapper
/// does not retry a failed source; retry, if any, belongs to the
/// inference collaborator.
pub struct AccumulatingAnswer {
    inner: Pin<Box<dyn Stream<Item = Result<String>> + Send>>,
    outcome_tx: Option<tokio::sync::oneshot::Sender<AnswerOutcome>>,
    buffer: String,
    done: bool,
}

impl AccumulatingAnswer {
    /// Wraps a fragment stream.
    ///
    /// Returns the snapshot stream and a receiver that resolves to the
    /// accumulated [`AnswerOutcome`] once the stream terminates. Dropping
    /// the stream undrained drops the sender, which the receiver observes
    /// as cancellation.
    pub fn new<S>(stream: S) -> (Self, tokio::sync::oneshot::Receiver<AnswerOutcome>)
    where
        S: Stream<Item = Result<String>> + Send + 'static,
    {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let this = Self {
            inner: Box::pin(stream),
            outcome_tx: Some(tx),
            buffer: String::new(),
            done: false,
        };
        (this, rx)
    }

    fn deliver(&mut self, stream_error: Option<&Error>) {
        if let Some(tx) = self.outcome_tx.take() {
            let _ = tx.send(AnswerOutcome {
                raw: self.buffer.clone(),
                stream_error: stream_error.map(|e| e.to_string()),
            });
        }
    }
}

impl Stream for AccumulatingAnswer {
    type Item = Snapshot;

    fn poll_next(
        self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return std::task::Poll::Ready(None);
        }
        match this.inner.as_mut().poll_next(cx) {
            std::task::Poll::Ready(Some(Ok(fragment))) => {
                this.buffer.push_str(&fragment);
                std::task::Poll::Ready(Some(Snapshot::Partial(this.buffer.clone())))
            }
            std::task::Poll::Ready(Some(Err(err))) => {
                this.done = true;
                this.deliver(Some(&err));
                let marked = format!("{}{}", this.buffer, error_marker(&err));
                std::task::Poll::Ready(Some(Snapshot::Final(marked)))
            }
            std::task::Poll::Ready(None) => {
                this.done = true;
                this.deliver(None);
                let finalized = if this.buffer.is_empty() {
                    NO_RESPONSE.to_string()
                } else {
                    finalize_answer(&this.buffer)
                };
                std::task::Poll::Ready(Some(Snapshot::Final(finalized)))
            }
            std::task::Poll::Pending => std::task::Poll::Pending,
        }
    }
}

/// The visible marker appended to a partially streamed answer when the
/// source fails.
pub fn error_marker(err: &Error) -> String {
    format!("\n\n[stream error: {err}]")
}

/// Applies the post-stream finalization pass.
///
/// Fenced code regions are wrapped in marked blocks and the verification
/// footer is appended; non-code text is left unchanged.
pub fn finalize_answer(text: &str) -> String {
    let mut finalized = format_code_blocks(text);
    finalized.push_str(VERIFY_FOOTER);
    finalized
}

/// Rewrites triple-backtick fenced regions as marked code blocks.
///
/// A fence with no language tag is treated as python, matching the
/// tutor's bias toward python examples. An unterminated fence is left
/// exactly as it streamed.
fn format_code_blocks(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("```") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 3..];
        let (lang, body) = match after.find('\n') {
            Some(newline) => (after[..newline].trim(), &after[newline + 1..]),
            None => ("", &after[after.len()..]),
        };
        let Some(end) = body.find("```") else {
            out.push_str(&rest[start..]);
            return out;
        };
        let code = &body[..end];
        let lang = if lang.is_empty() { "python" } else { lang };
        out.push_str(&format!("[code: {lang}]\n{code}[/code]"));
        rest = &body[end + 3..];
    }
    out.push_str(rest);
    out
}
