use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::retry::RetryOptions;

/// Retry defaults (optional section in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of retries after the first failure.
    pub max_retries: u32,
    /// Free-text hint passed to the oracle with every request.
    pub remarks: String,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let opts = RetryOptions::default();
        Self {
            max_retries: opts.max_retries,
            remarks: opts.remarks,
        }
    }
}

/// Chat-completions endpoint used as the retry oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Full URL of an OpenAI-compatible `/chat/completions` endpoint.
    pub endpoint: String,
    /// Model name sent with each request.
    pub model: String,
    /// Environment variable holding the API key (None = no Authorization header).
    #[serde(default)]
    pub api_key_env: Option<String>,
    /// Overrides the built-in system instruction (the verdict output contract).
    #[serde(default)]
    pub system_instruction: Option<String>,
    /// Sampling temperature (None = provider default).
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Connect timeout in seconds for the oracle HTTP call (0 = libcurl default).
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Total timeout in seconds for the oracle HTTP call (0 = no limit).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_connect_timeout_secs() -> u64 {
    15
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4.1-nano".to_string(),
            api_key_env: Some("OPENAI_API_KEY".to_string()),
            system_instruction: None,
            temperature: None,
            connect_timeout_secs: default_connect_timeout_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl OracleConfig {
    /// Reject endpoints that are not absolute http(s) URLs.
    pub fn validate(&self) -> Result<()> {
        let parsed = url::Url::parse(&self.endpoint)
            .with_context(|| format!("invalid oracle endpoint {:?}", self.endpoint))?;
        match parsed.scheme() {
            "http" | "https" => {}
            other => anyhow::bail!("oracle endpoint must be http or https, got {}", other),
        }
        if self.model.trim().is_empty() {
            anyhow::bail!("oracle model must not be empty");
        }
        Ok(())
    }
}

/// Global configuration loaded from `~/.config/vibe-retry/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VibeRetryConfig {
    /// Optional retry defaults; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
    #[serde(default)]
    pub oracle: OracleConfig,
}

impl VibeRetryConfig {
    /// Retry options from the `[retry]` section, or the built-in defaults.
    pub fn retry_options(&self) -> RetryOptions {
        match &self.retry {
            Some(r) => RetryOptions {
                max_retries: r.max_retries,
                remarks: r.remarks.clone(),
            },
            None => RetryOptions::default(),
        }
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("vibe-retry")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<VibeRetryConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = VibeRetryConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    load_from_path(&path)
}

/// Load and validate configuration from an explicit file.
pub fn load_from_path(path: &Path) -> Result<VibeRetryConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let cfg: VibeRetryConfig = toml::from_str(&data)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    cfg.oracle.validate()?;
    Ok(cfg)
}
