//! Retry loop: run an operation until it succeeds, the oracle says stop,
//! or the retry budget runs out.

use std::fmt;
use std::time::Duration;

use super::error::RetryError;
use super::failure::FailureRecord;
use super::request::DecisionRequest;
use super::session::RetrySession;
use super::sleep::{Sleeper, ThreadSleeper};
use crate::oracle::DecisionOracle;

/// Per-call retry settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryOptions {
    /// Retries allowed after the first failure (0 = never retry).
    pub max_retries: u32,
    /// Free-text context for the oracle, e.g. "use exponential backoff".
    pub remarks: String,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_retries: 1,
            remarks: String::new(),
        }
    }
}

impl RetryOptions {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    pub fn with_remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = remarks.into();
        self
    }
}

/// The call being guarded: a diagnostic name plus the arguments the operation
/// receives on every attempt.
#[derive(Debug)]
pub struct Invocation<'a, A: ?Sized> {
    pub name: &'a str,
    pub args: &'a A,
}

impl<'a, A: ?Sized> Invocation<'a, A> {
    pub fn new(name: &'a str, args: &'a A) -> Self {
        Self { name, args }
    }
}

/// Runs `op` until it succeeds or the oracle (or the retry budget) says to stop.
///
/// The oracle is consulted only after a failure and only while retries remain.
/// On an approved retry the calling thread sleeps for the verdict's delay, then
/// `op` is called again with the same arguments. When the loop gives up, the
/// operation's last error is returned as-is in [`RetryError::Operation`]; an
/// oracle failure ends the loop at once with [`RetryError::Oracle`].
pub fn run_with_retry<A, T, E, O, S, F>(
    options: &RetryOptions,
    oracle: &O,
    sleeper: &S,
    invocation: Invocation<'_, A>,
    mut op: F,
) -> Result<T, RetryError<E>>
where
    A: fmt::Debug + ?Sized,
    E: fmt::Display + fmt::Debug,
    O: DecisionOracle + ?Sized,
    S: Sleeper + ?Sized,
    F: FnMut(&A) -> Result<T, E>,
{
    let mut session = RetrySession::new(options.max_retries);
    loop {
        let err = match op(invocation.args) {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if session.exhausted() {
            tracing::warn!(
                operation = invocation.name,
                retries = session.attempts(),
                error = %err,
                "retries exhausted"
            );
            return Err(RetryError::Operation(err));
        }

        let failure = FailureRecord::capture(invocation.name, invocation.args, &err);
        tracing::debug!(
            operation = invocation.name,
            attempt = session.attempts() + 1,
            kind = %failure.error_kind,
            error = %failure.error_message,
            "operation failed; consulting oracle"
        );
        let request = DecisionRequest::new(session.history(), &options.remarks, failure);
        let verdict = match oracle.evaluate(&request) {
            Ok(raw) => raw.resolve(),
            Err(e) => {
                tracing::error!(operation = invocation.name, error = %e, "retry oracle failed");
                return Err(RetryError::Oracle(e));
            }
        };

        if !verdict.should_retry {
            tracing::info!(
                operation = invocation.name,
                retries = session.attempts(),
                error = %err,
                "oracle declined retry"
            );
            return Err(RetryError::Operation(err));
        }

        match session.schedule(verdict.delay) {
            Some(entry) => tracing::info!(
                operation = invocation.name,
                attempt = entry.attempt,
                delay_secs = entry.delay,
                "retrying"
            ),
            None => {
                tracing::warn!(
                    operation = invocation.name,
                    retries = session.attempts(),
                    error = %err,
                    "retries exhausted"
                );
                return Err(RetryError::Operation(err));
            }
        }
        if verdict.delay > 0 {
            sleeper.sleep(Duration::from_secs(verdict.delay));
        }
    }
}

/// Retry policy object: an oracle, a sleeper, and default [`RetryOptions`].
///
/// This is the wrapper equivalent of decorating a function: `call` guards one
/// call, `wrap` turns an operation into a guarded closure with the same
/// argument and result types.
#[derive(Debug, Clone)]
pub struct VibeRetry<O, S = ThreadSleeper> {
    oracle: O,
    sleeper: S,
    defaults: RetryOptions,
}

impl<O: DecisionOracle> VibeRetry<O> {
    pub fn new(oracle: O) -> Self {
        Self {
            oracle,
            sleeper: ThreadSleeper,
            defaults: RetryOptions::default(),
        }
    }
}

impl<O: DecisionOracle, S: Sleeper> VibeRetry<O, S> {
    /// Replace the sleeper (tests use a recording one).
    pub fn with_sleeper<S2: Sleeper>(self, sleeper: S2) -> VibeRetry<O, S2> {
        VibeRetry {
            oracle: self.oracle,
            sleeper,
            defaults: self.defaults,
        }
    }

    pub fn with_defaults(mut self, defaults: RetryOptions) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn defaults(&self) -> &RetryOptions {
        &self.defaults
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Guard one call using the default options.
    pub fn call<A, T, E, F>(&self, name: &str, args: &A, op: F) -> Result<T, RetryError<E>>
    where
        A: fmt::Debug + ?Sized,
        E: fmt::Display + fmt::Debug,
        F: FnMut(&A) -> Result<T, E>,
    {
        self.call_with(&self.defaults, name, args, op)
    }

    /// Guard one call with explicit options.
    pub fn call_with<A, T, E, F>(
        &self,
        options: &RetryOptions,
        name: &str,
        args: &A,
        op: F,
    ) -> Result<T, RetryError<E>>
    where
        A: fmt::Debug + ?Sized,
        E: fmt::Display + fmt::Debug,
        F: FnMut(&A) -> Result<T, E>,
    {
        run_with_retry(
            options,
            &self.oracle,
            &self.sleeper,
            Invocation::new(name, args),
            op,
        )
    }

    /// Wrap `op` so every call goes through the retry loop.
    pub fn wrap<'s, A, T, E, F>(
        &'s self,
        name: &'s str,
        options: RetryOptions,
        mut op: F,
    ) -> impl FnMut(&A) -> Result<T, RetryError<E>> + 's
    where
        A: fmt::Debug + ?Sized + 's,
        T: 's,
        E: fmt::Display + fmt::Debug + 's,
        F: FnMut(&A) -> Result<T, E> + 's,
    {
        move |args: &A| self.call_with(&options, name, args, &mut op)
    }
}
