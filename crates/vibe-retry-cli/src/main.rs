use vibe_retry_core::logging;

mod cli;

use crate::cli::CliCommand;

fn main() {
    // Initialize logging as early as possible; fall back to stderr if the state dir is unusable.
    if logging::init_logging().is_err() {
        logging::init_logging_stderr();
    }

    // Parse CLI and dispatch.
    match CliCommand::run_from_args() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("vibe-retry error: {:#}", err);
            std::process::exit(1);
        }
    }
}
