//! Decision request sent to the oracle on each failure.

use serde::Serialize;

use super::failure::FailureRecord;
use super::history::AttemptHistoryEntry;

/// Everything the oracle gets to see about one failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecisionRequest {
    pub history: Vec<AttemptHistoryEntry>,
    pub remarks: String,
    pub failure: FailureRecord,
}

impl DecisionRequest {
    pub fn new(history: &[AttemptHistoryEntry], remarks: &str, failure: FailureRecord) -> Self {
        Self {
            history: history.to_vec(),
            remarks: remarks.to_string(),
            failure,
        }
    }

    /// Render the user prompt: history and remarks as header lines, then the
    /// failure context as a JSON block.
    pub fn render_prompt(&self) -> String {
        // Serializing plain structs of strings and integers cannot fail.
        let history = serde_json::to_string(&self.history).unwrap_or_else(|_| "[]".to_string());
        let context = serde_json::to_string(&self.failure).unwrap_or_else(|_| "{}".to_string());
        format!(
            "HISTORICAL_ATTEMPTS: {history}\n\
             ADDITIONAL REMARKS: {remarks}\n\
             TASK: Given the following failure context, decide whether to retry and for how long.\n\n\
             CONTEXT:\n{context}",
            remarks = self.remarks,
        )
    }
}
