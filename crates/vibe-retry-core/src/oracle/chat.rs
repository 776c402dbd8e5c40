//! OpenAI-compatible chat-completions oracle.
//!
//! Uses the curl crate (libcurl) for a blocking POST: the retry loop is
//! synchronous, so the oracle call simply blocks the calling thread too.

use serde_json::{json, Value};
use std::fmt;
use std::time::Duration;

use super::{DecisionOracle, OracleError};
use crate::config::OracleConfig;
use crate::retry::{DecisionRequest, RawVerdict};

/// Output contract given to the model as its system message.
pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are a function. Return ONLY a valid JSON STRING, with no code fences, \
no markdown formatting, and no explanations. It must have EXACTLY two keys:\n  \
\"should_retry\": a boolean (true or false)\n  \
\"delay\": an integer number of seconds\n\
Do not include any text before or after the JSON. Output must look like:\n\
{\"should_retry\": false, \"delay\": 0}";

const BODY_EXCERPT_CHARS: usize = 500;

/// Oracle backed by a chat-completions endpoint.
#[derive(Clone)]
pub struct ChatCompletionsOracle {
    endpoint: String,
    model: String,
    api_key: Option<String>,
    system_instruction: String,
    temperature: Option<f64>,
    connect_timeout: Option<Duration>,
    timeout: Option<Duration>,
}

impl ChatCompletionsOracle {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: None,
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
            temperature: None,
            connect_timeout: None,
            timeout: None,
        }
    }

    /// Build from the `[oracle]` config section. The API key is read from the
    /// environment variable the config names, if any.
    pub fn from_config(cfg: &OracleConfig) -> Result<Self, OracleError> {
        let mut oracle = Self::new(&cfg.endpoint, &cfg.model);
        if let Some(var) = &cfg.api_key_env {
            let key = std::env::var(var).map_err(|_| OracleError::MissingApiKey(var.clone()))?;
            oracle = oracle.with_api_key(key);
        }
        if let Some(instruction) = &cfg.system_instruction {
            oracle = oracle.with_system_instruction(instruction.clone());
        }
        oracle.temperature = cfg.temperature;
        // 0 leaves the libcurl default (no limit) in place.
        oracle.connect_timeout = (cfg.connect_timeout_secs > 0)
            .then(|| Duration::from_secs(cfg.connect_timeout_secs));
        oracle.timeout = (cfg.timeout_secs > 0).then(|| Duration::from_secs(cfg.timeout_secs));
        Ok(oracle)
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = instruction.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_timeouts(mut self, connect: Duration, total: Duration) -> Self {
        self.connect_timeout = Some(connect);
        self.timeout = Some(total);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// JSON body for one decision request.
    fn request_body(&self, prompt: &str) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": self.system_instruction },
                { "role": "user", "content": prompt },
            ],
        });
        if let Some(t) = self.temperature {
            body["temperature"] = json!(t);
        }
        body
    }

    /// POST `body` and return (status, response body).
    fn post(&self, body: &[u8]) -> Result<(u32, Vec<u8>), OracleError> {
        let mut response = Vec::new();

        let mut easy = curl::easy::Easy::new();
        easy.url(&self.endpoint)?;
        easy.post(true)?;
        easy.post_fields_copy(body)?;
        if let Some(t) = self.connect_timeout {
            easy.connect_timeout(t)?;
        }
        if let Some(t) = self.timeout {
            easy.timeout(t)?;
        }

        let mut list = curl::easy::List::new();
        list.append("Content-Type: application/json")?;
        list.append("Accept: application/json")?;
        // Suppress `Expect: 100-continue` on larger prompts.
        list.append("Expect:")?;
        if let Some(key) = &self.api_key {
            list.append(&format!("Authorization: Bearer {}", key))?;
        }
        easy.http_headers(list)?;

        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                response.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }

        let status = easy.response_code()?;
        Ok((status, response))
    }
}

// API key stays out of Debug output.
impl fmt::Debug for ChatCompletionsOracle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatCompletionsOracle")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("temperature", &self.temperature)
            .field("connect_timeout", &self.connect_timeout)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Pull `choices[0].message.content` out of a chat-completions response.
fn extract_content(response: &[u8]) -> Result<String, OracleError> {
    let value: Value = serde_json::from_slice(response).map_err(|e| {
        OracleError::MalformedResponse(format!("{}: {}", e, body_excerpt(response)))
    })?;
    value
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(OracleError::MissingContent)
}

fn body_excerpt(body: &[u8]) -> String {
    String::from_utf8_lossy(body)
        .chars()
        .take(BODY_EXCERPT_CHARS)
        .collect()
}

impl DecisionOracle for ChatCompletionsOracle {
    fn evaluate(&self, request: &DecisionRequest) -> Result<RawVerdict, OracleError> {
        let prompt = request.render_prompt();
        let body = self.request_body(&prompt);
        let payload =
            serde_json::to_vec(&body).map_err(|e| OracleError::MalformedResponse(e.to_string()))?;

        tracing::debug!(
            endpoint = %self.endpoint,
            model = %self.model,
            prompt_bytes = prompt.len(),
            "consulting retry oracle"
        );
        let (status, response) = self.post(&payload)?;
        if !(200..300).contains(&status) {
            return Err(OracleError::Http {
                status,
                body: body_excerpt(&response),
            });
        }

        let content = extract_content(&response)?;
        tracing::debug!(content = %content, "oracle answered");
        RawVerdict::from_text(&content)
    }
}
