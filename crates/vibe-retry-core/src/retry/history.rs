use serde::Serialize;

/// One retry that the oracle approved and the loop scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AttemptHistoryEntry {
    /// 1-based index of the retry this entry schedules.
    pub attempt: u32,
    /// Delay in seconds applied before that retry.
    pub delay: u64,
}
