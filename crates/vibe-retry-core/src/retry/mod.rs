//! LLM-driven retry loop.
//!
//! The orchestrator runs an operation, and on each failure asks a
//! [`DecisionOracle`] whether to retry and how long to wait. The oracle sees
//! the failure context plus the history of retries already scheduled in the
//! current invocation, so it can grow the backoff when the same failure
//! keeps coming back.

mod error;
mod failure;
mod history;
mod request;
mod run;
mod session;
mod sleep;
mod verdict;

pub use error::RetryError;
pub use failure::{FailureRecord, TRACE_LIMIT};
pub use history::AttemptHistoryEntry;
pub use request::DecisionRequest;
pub use run::{run_with_retry, Invocation, RetryOptions, VibeRetry};
pub use session::RetrySession;
pub use sleep::{Sleeper, ThreadSleeper};
pub use verdict::{DecisionVerdict, RawVerdict};

pub use crate::oracle::{DecisionOracle, OracleError};
