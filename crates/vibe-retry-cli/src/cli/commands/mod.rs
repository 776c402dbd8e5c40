//! CLI command handlers. Each command is in its own file.

mod completions;
mod config;
mod exec;
mod man;

pub use completions::run_completions;
pub use config::run_config;
pub use exec::{run_exec, ExecArgs};
pub use man::run_man;
