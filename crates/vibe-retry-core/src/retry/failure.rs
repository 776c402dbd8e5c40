//! Failure context captured for the decision oracle.

use serde::Serialize;
use std::fmt;

/// Upper bound (in characters) on the trace text sent to the oracle.
/// Keeps the request size bounded for errors with long cause chains or backtraces.
pub const TRACE_LIMIT: usize = 4000;

const TRUNCATION_MARKER: &str = "...";

/// Snapshot of one failure, taken when the operation returns an error.
///
/// Serialized field names are the ones the oracle prompt uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    #[serde(rename = "function_name")]
    pub operation: String,
    pub args: String,
    #[serde(rename = "exception_type")]
    pub error_kind: String,
    #[serde(rename = "exception_message")]
    pub error_message: String,
    #[serde(rename = "traceback")]
    pub trace: String,
}

impl FailureRecord {
    /// Capture a failure of `operation` called with `args`.
    pub fn capture<A, E>(operation: &str, args: &A, error: &E) -> Self
    where
        A: fmt::Debug + ?Sized,
        E: fmt::Display + fmt::Debug,
    {
        Self {
            operation: operation.to_string(),
            args: format!("{:?}", args),
            error_kind: short_type_name(std::any::type_name::<E>()).to_string(),
            error_message: error.to_string(),
            trace: truncate_tail(&format!("{:?}", error), TRACE_LIMIT),
        }
    }
}

/// `my_crate::io::ReadError<u8>` -> `ReadError<u8>`.
fn short_type_name(full: &str) -> &str {
    let head_end = full.find('<').unwrap_or(full.len());
    let start = full[..head_end].rfind("::").map(|i| i + 2).unwrap_or(0);
    &full[start..]
}

/// Keep at most `limit` characters, dropping from the front so the innermost
/// causes (printed last) survive.
fn truncate_tail(text: &str, limit: usize) -> String {
    let count = text.chars().count();
    if count <= limit {
        return text.to_string();
    }
    let keep = limit.saturating_sub(TRUNCATION_MARKER.len());
    let skip = count - keep;
    let start = text
        .char_indices()
        .nth(skip)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    format!("{}{}", TRUNCATION_MARKER, &text[start..])
}
