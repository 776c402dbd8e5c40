//! `vibe-retry config` – show where the config lives and what is in effect.

use anyhow::Result;
use std::path::Path;
use vibe_retry_core::config::{self, VibeRetryConfig};

pub fn run_config(cfg: &VibeRetryConfig, explicit: Option<&Path>) -> Result<()> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => config::config_path()?,
    };
    println!("# {}", path.display());
    print!("{}", cfg.to_toml_string()?);
    Ok(())
}
