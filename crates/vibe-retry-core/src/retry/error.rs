//! Error returned by the retry loop.

use std::fmt;

use crate::oracle::OracleError;

/// Outcome of a failed retry loop.
///
/// The two variants are separate fault channels: `Operation` carries the
/// wrapped operation's own error from its final attempt, untouched, while
/// `Oracle` means the retry machinery itself failed.
#[derive(Debug)]
pub enum RetryError<E> {
    /// The operation failed and was not (or no longer) retried.
    Operation(E),
    /// The decision oracle could not produce a verdict.
    Oracle(OracleError),
}

impl<E> RetryError<E> {
    /// The operation's error, if that is what ended the loop.
    pub fn into_operation(self) -> Option<E> {
        match self {
            RetryError::Operation(e) => Some(e),
            RetryError::Oracle(_) => None,
        }
    }

    pub fn is_oracle(&self) -> bool {
        matches!(self, RetryError::Oracle(_))
    }
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryError::Operation(e) => write!(f, "{}", e),
            RetryError::Oracle(e) => write!(f, "retry oracle failed: {}", e),
        }
    }
}

impl<E> std::error::Error for RetryError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RetryError::Operation(e) => e.source(),
            RetryError::Oracle(e) => Some(e),
        }
    }
}
