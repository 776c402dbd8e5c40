//! Tests for `exec` argument parsing.

use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;

#[test]
fn cli_parse_exec_defaults() {
    match parse(&["vibe-retry", "exec", "curl", "-fsS", "https://example.com"]) {
        CliCommand::Exec {
            max_retries,
            remarks,
            name,
            command,
        } => {
            assert!(max_retries.is_none());
            assert!(remarks.is_none());
            assert!(name.is_none());
            assert_eq!(command, vec!["curl", "-fsS", "https://example.com"]);
        }
        _ => panic!("expected Exec"),
    }
}

#[test]
fn cli_parse_exec_with_options_and_separator() {
    match parse(&[
        "vibe-retry",
        "exec",
        "--max-retries",
        "3",
        "--remarks",
        "use exponential backoff",
        "--name",
        "sync",
        "--",
        "rsync",
        "-a",
        "--delete",
        "src/",
        "dst/",
    ]) {
        CliCommand::Exec {
            max_retries,
            remarks,
            name,
            command,
        } => {
            assert_eq!(max_retries, Some(3));
            assert_eq!(remarks.as_deref(), Some("use exponential backoff"));
            assert_eq!(name.as_deref(), Some("sync"));
            assert_eq!(command, vec!["rsync", "-a", "--delete", "src/", "dst/"]);
        }
        _ => panic!("expected Exec"),
    }
}

#[test]
fn cli_parse_exec_requires_command() {
    assert!(Cli::try_parse_from(["vibe-retry", "exec"]).is_err());
}

#[test]
fn cli_parse_exec_rejects_negative_retries() {
    assert!(Cli::try_parse_from(["vibe-retry", "exec", "--max-retries", "-1", "--", "true"]).is_err());
}
