//! `vibe-retry exec -- <command>` – run a command under the LLM retry policy.

use anyhow::Result;
use std::io::{self, Write};
use std::process::{Command, ExitStatus, Output};
use thiserror::Error;
use vibe_retry_core::config::VibeRetryConfig;
use vibe_retry_core::oracle::{ChatCompletionsOracle, DecisionOracle};
use vibe_retry_core::retry::{RetryError, RetryOptions, Sleeper, VibeRetry};

/// Exit code when the retry machinery itself fails.
pub const ORACLE_FAILURE_EXIT: i32 = 2;

/// Only the end of stderr is kept; the retry loop bounds it again for the prompt.
const STDERR_TAIL_BYTES: usize = 8 * 1024;

/// Parsed `exec` arguments.
#[derive(Debug, Clone)]
pub struct ExecArgs {
    pub max_retries: Option<u32>,
    pub remarks: Option<String>,
    pub name: Option<String>,
    pub command: Vec<String>,
}

/// One failed run of the child command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("{program} exited with {status}")]
    Failed {
        program: String,
        code: Option<i32>,
        /// Terminating signal when the child was killed (unix only).
        signal: Option<i32>,
        status: String,
        stderr: String,
    },
}

impl CommandError {
    /// Exit code to hand back to the shell.
    pub fn exit_code(&self) -> i32 {
        match self {
            CommandError::Spawn { source, .. } if source.kind() == io::ErrorKind::NotFound => 127,
            CommandError::Spawn { .. } => 126,
            // Shell convention: killed by signal N exits 128 + N.
            CommandError::Failed { code, signal, .. } => {
                code.or(signal.map(|s| 128 + s)).unwrap_or(1)
            }
        }
    }
}

pub fn run_exec(cfg: &VibeRetryConfig, args: ExecArgs) -> Result<i32> {
    let oracle = ChatCompletionsOracle::from_config(&cfg.oracle)?;
    tracing::debug!(endpoint = oracle.endpoint(), model = oracle.model(), "oracle ready");
    let retry = VibeRetry::new(oracle);
    Ok(exec_with(&retry, &options_for(cfg, &args), &args))
}

/// CLI flags override the `[retry]` config section.
fn options_for(cfg: &VibeRetryConfig, args: &ExecArgs) -> RetryOptions {
    let mut options = cfg.retry_options();
    if let Some(n) = args.max_retries {
        options.max_retries = n;
    }
    if let Some(r) = &args.remarks {
        options.remarks = r.clone();
    }
    options
}

/// Run the command through `retry` and map the outcome to an exit code.
pub fn exec_with<O, S>(retry: &VibeRetry<O, S>, options: &RetryOptions, args: &ExecArgs) -> i32
where
    O: DecisionOracle,
    S: Sleeper,
{
    let argv = args.command.as_slice();
    let name = args
        .name
        .as_deref()
        .or_else(|| argv.first().map(String::as_str))
        .unwrap_or("command");

    match retry.call_with(options, name, argv, run_once) {
        Ok(output) => {
            let _ = io::stdout().write_all(&output.stdout);
            let _ = io::stderr().write_all(&output.stderr);
            0
        }
        Err(RetryError::Operation(e)) => {
            eprintln!("vibe-retry: {}", e);
            e.exit_code()
        }
        Err(RetryError::Oracle(e)) => {
            eprintln!("vibe-retry: retry oracle failed: {}", e);
            ORACLE_FAILURE_EXIT
        }
    }
}

/// Run `argv` once, capturing output. A non-zero exit is an error.
pub fn run_once(argv: &[String]) -> Result<Output, CommandError> {
    let (program, rest) = match argv.split_first() {
        Some(split) => split,
        None => {
            return Err(CommandError::Spawn {
                program: String::new(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "empty command"),
            })
        }
    };

    let output = Command::new(program)
        .args(rest)
        .output()
        .map_err(|source| CommandError::Spawn {
            program: program.clone(),
            source,
        })?;

    if output.status.success() {
        return Ok(output);
    }

    // Show the failed attempt's stderr as it happens.
    let _ = io::stderr().write_all(&output.stderr);
    Err(CommandError::Failed {
        program: program.clone(),
        code: output.status.code(),
        signal: exit_signal(&output.status),
        status: output.status.to_string(),
        stderr: stderr_tail(&output.stderr),
    })
}

#[cfg(unix)]
fn exit_signal(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &ExitStatus) -> Option<i32> {
    None
}

fn stderr_tail(stderr: &[u8]) -> String {
    let start = stderr.len().saturating_sub(STDERR_TAIL_BYTES);
    String::from_utf8_lossy(&stderr[start..]).into_owned()
}
