//! Bounded conversation memory.
//!
//! The memory window holds the ordered turn history and enforces the
//! retention policy: besides the system turn at position 0, at most `W`
//! user/assistant pairs survive, oldest pairs evicted first.

use crate::types::Turn;

/// An ordered turn history with a bounded retention window.
///
/// Invariants maintained across `append` + `trim`:
/// - the sequence holds at most one system turn, always at position 0;
/// - the system turn is never evicted and never counts against the window;
/// - after `trim`, the length is at most `2 * window + 1` and the
///   surviving pairs are the most recent ones.
#[derive(Debug, Clone)]
pub struct MemoryWindow {
    turns: Vec<Turn>,
    window: usize,
}

impl MemoryWindow {
    /// Creates a window retaining `window` user/assistant pairs, seeded
    /// with the given system turn.
    pub fn new(system: Turn, window: usize) -> Self {
        Self {
            turns: vec![system],
            window,
        }
    }

    /// Creates an empty window with no system turn.
    ///
    /// Normal session lifecycle always seeds a system turn; this exists
    /// for callers that manage the head turn themselves.
    pub fn unseeded(window: usize) -> Self {
        Self {
            turns: Vec::new(),
            window,
        }
    }

    /// Appends one turn at the end. Never reorders, never deduplicates.
    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Enforces the retention invariant.
    ///
    /// If the length exceeds `2 * window + 1`, keeps position 0 plus the
    /// last `2 * window` turns and discards the rest. Idempotent: a
    /// compliant sequence is left untouched. Does not inspect roles, so
    /// an absent system turn is not fabricated; whatever sits at
    /// position 0 is preserved.
    pub fn trim(&mut self) {
        let max_len = 2 * self.window + 1;
        if self.turns.len() <= max_len {
            return;
        }
        let tail_start = self.turns.len() - 2 * self.window;
        self.turns.drain(1..tail_start);
    }

    /// Replaces the history with just the given system turn.
    pub fn reset(&mut self, system: Turn) {
        self.turns.clear();
        self.turns.push(system);
    }

    /// Replaces the content of the system turn at position 0, if present.
    pub fn set_system(&mut self, system: Turn) {
        match self.turns.first_mut() {
            Some(head) if head.is_system() => *head = system,
            _ => self.turns.insert(0, system),
        }
    }

    /// Returns the retained turns in order.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Returns the configured pair count `W`.
    pub fn window(&self) -> usize {
        self.window
    }

    /// Reconfigures the pair count for subsequent trims.
    pub fn set_window(&mut self, window: usize) {
        self.window = window;
    }

    /// Returns the number of retained turns, the system turn included.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Returns true if no turns are retained.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
