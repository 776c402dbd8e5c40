//! CLI for vibe-retry.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use vibe_retry_core::config;

use commands::{run_completions, run_config, run_exec, run_man, ExecArgs};

/// Top-level CLI for vibe-retry.
#[derive(Debug, Parser)]
#[command(name = "vibe-retry")]
#[command(about = "Run a command and let a language model decide whether and when to retry it", long_about = None)]
pub struct Cli {
    /// Use this config file instead of ~/.config/vibe-retry/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Run a command, consulting the oracle after each failure.
    Exec {
        /// Retries allowed after the first failure (default from config, else 1).
        #[arg(long, value_name = "N")]
        max_retries: Option<u32>,
        /// Extra context for the oracle, e.g. "use exponential backoff".
        #[arg(long)]
        remarks: Option<String>,
        /// Name reported to the oracle (default: the program name).
        #[arg(long)]
        name: Option<String>,
        /// Program and arguments to run.
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true, value_name = "COMMAND")]
        command: Vec<String>,
    },

    /// Show the config file path and the effective configuration.
    Config,

    /// Print shell completions.
    Completions {
        /// Target shell.
        shell: Shell,
    },

    /// Print the man page (roff).
    Man,
}

impl CliCommand {
    /// Parse arguments, run the command, and return the process exit code.
    pub fn run_from_args() -> Result<i32> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Completions { shell } => return run_completions(shell).map(|_| 0),
            CliCommand::Man => return run_man().map(|_| 0),
            _ => {}
        }

        let cfg = match &cli.config {
            Some(path) => config::load_from_path(path)?,
            None => config::load_or_init()?,
        };
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Exec {
                max_retries,
                remarks,
                name,
                command,
            } => run_exec(
                &cfg,
                ExecArgs {
                    max_retries,
                    remarks,
                    name,
                    command,
                },
            ),
            CliCommand::Config => run_config(&cfg, cli.config.as_deref()).map(|_| 0),
            CliCommand::Completions { .. } | CliCommand::Man => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests;
