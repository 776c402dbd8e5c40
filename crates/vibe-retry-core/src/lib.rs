pub mod config;
pub mod logging;

pub mod oracle;
pub mod retry;
