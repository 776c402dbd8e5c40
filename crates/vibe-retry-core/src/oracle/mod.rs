//! Decision oracles: whatever answers "retry, and after how long?".
//!
//! The retry loop only knows the [`DecisionOracle`] trait. [`ChatCompletionsOracle`]
//! implements it against an OpenAI-compatible chat-completions endpoint; tests and
//! embedders can pass a closure instead.

mod chat;

pub use chat::{ChatCompletionsOracle, DEFAULT_SYSTEM_INSTRUCTION};

use thiserror::Error;

use crate::retry::{DecisionRequest, RawVerdict};

/// Answers a retry decision request.
pub trait DecisionOracle {
    fn evaluate(&self, request: &DecisionRequest) -> Result<RawVerdict, OracleError>;
}

impl<F> DecisionOracle for F
where
    F: Fn(&DecisionRequest) -> Result<RawVerdict, OracleError>,
{
    fn evaluate(&self, request: &DecisionRequest) -> Result<RawVerdict, OracleError> {
        self(request)
    }
}

/// Failure of the oracle itself, as opposed to the operation being retried.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle transport failed: {0}")]
    Transport(#[from] curl::Error),
    #[error("oracle returned HTTP {status}: {body}")]
    Http { status: u32, body: String },
    #[error("oracle response has no message content")]
    MissingContent,
    #[error("oracle response is not valid JSON: {0}")]
    MalformedResponse(String),
    #[error("oracle verdict is malformed: {0}")]
    MalformedVerdict(String),
    #[error("API key environment variable {0} is not set")]
    MissingApiKey(String),
}
