//! Per-invocation retry bookkeeping.

use super::history::AttemptHistoryEntry;

/// Transient state of one retry loop. Lives on the caller's stack for the
/// duration of a single invocation.
///
/// `history().len()` always equals `attempts()`, and `attempts()` never
/// exceeds `max_retries()`.
#[derive(Debug, Clone)]
pub struct RetrySession {
    attempts: u32,
    max_retries: u32,
    history: Vec<AttemptHistoryEntry>,
}

impl RetrySession {
    pub fn new(max_retries: u32) -> Self {
        Self {
            attempts: 0,
            max_retries,
            history: Vec::new(),
        }
    }

    /// Retries performed so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn history(&self) -> &[AttemptHistoryEntry] {
        &self.history
    }

    /// True once the retry budget is spent; the oracle must not be consulted then.
    pub fn exhausted(&self) -> bool {
        self.attempts >= self.max_retries
    }

    /// Record an approved retry with `delay` seconds and count it.
    /// Returns the recorded entry, or `None` if the budget is already spent.
    pub fn schedule(&mut self, delay: u64) -> Option<AttemptHistoryEntry> {
        if self.exhausted() {
            return None;
        }
        let entry = AttemptHistoryEntry {
            attempt: self.attempts + 1,
            delay,
        };
        self.history.push(entry);
        self.attempts += 1;
        Some(entry)
    }
}
