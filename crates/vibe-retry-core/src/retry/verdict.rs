//! Oracle verdicts: the raw answer and its resolved, typed form.

use serde::Deserialize;
use serde_json::Value;

use crate::oracle::OracleError;

/// Resolved retry decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecisionVerdict {
    pub should_retry: bool,
    /// Whole seconds to wait before the retry.
    pub delay: u64,
}

/// Oracle answer as received. Both fields are optional and untyped so a
/// sloppy answer can still be resolved with defaults; unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct RawVerdict {
    #[serde(default)]
    pub should_retry: Option<Value>,
    #[serde(default)]
    pub delay: Option<Value>,
}

impl RawVerdict {
    /// A well-formed verdict.
    pub fn new(should_retry: bool, delay: u64) -> Self {
        Self {
            should_retry: Some(Value::Bool(should_retry)),
            delay: Some(Value::from(delay)),
        }
    }

    /// Parse the oracle's text output. The text must be a JSON object, optionally
    /// wrapped in a Markdown code fence.
    pub fn from_text(text: &str) -> Result<Self, OracleError> {
        let body = strip_code_fence(text.trim());
        let value: Value = serde_json::from_str(body)
            .map_err(|e| OracleError::MalformedVerdict(format!("{}: {}", e, excerpt(body))))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, OracleError> {
        if !value.is_object() {
            return Err(OracleError::MalformedVerdict(format!(
                "expected a JSON object, got {}",
                excerpt(&value.to_string())
            )));
        }
        serde_json::from_value(value).map_err(|e| OracleError::MalformedVerdict(e.to_string()))
    }

    /// Apply the defaulting rules: anything that is not a recognizable boolean
    /// means "do not retry", anything that is not a recognizable number means
    /// "no delay", and delays are floored and clamped at zero.
    pub fn resolve(&self) -> DecisionVerdict {
        DecisionVerdict {
            should_retry: self.should_retry.as_ref().and_then(as_bool).unwrap_or(false),
            delay: self.delay.as_ref().and_then(as_delay).unwrap_or(0),
        }
    }
}

impl From<DecisionVerdict> for RawVerdict {
    fn from(v: DecisionVerdict) -> Self {
        RawVerdict::new(v.should_retry, v.delay)
    }
}

fn as_bool(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn as_delay(v: &Value) -> Option<u64> {
    match v {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                Some(u)
            } else if n.is_i64() {
                Some(0)
            } else {
                n.as_f64().map(floor_secs)
            }
        }
        Value::String(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                Some(i.max(0) as u64)
            } else {
                s.parse::<f64>().ok().filter(|f| f.is_finite()).map(floor_secs)
            }
        }
        _ => None,
    }
}

/// Floor to whole seconds; negatives become zero, huge values saturate.
fn floor_secs(f: f64) -> u64 {
    if f <= 0.0 {
        0
    } else {
        f.floor() as u64
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let Some(rest) = rest.strip_suffix("```") else {
        return text;
    };
    // Drop an info string such as `json`, whether or not a newline follows it.
    rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric())
        .trim()
}

fn excerpt(text: &str) -> String {
    const MAX: usize = 200;
    if text.chars().count() <= MAX {
        text.to_string()
    } else {
        let cut: String = text.chars().take(MAX).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resolve(v: Value) -> DecisionVerdict {
        RawVerdict::from_value(v).unwrap().resolve()
    }

    #[test]
    fn well_formed_verdict() {
        let v = RawVerdict::from_text(r#"{"should_retry": true, "delay": 3}"#).unwrap();
        assert_eq!(
            v.resolve(),
            DecisionVerdict {
                should_retry: true,
                delay: 3
            }
        );
    }

    #[test]
    fn missing_fields_default_to_stop_without_delay() {
        assert_eq!(resolve(json!({})), DecisionVerdict::default());
        assert_eq!(
            resolve(json!({"should_retry": true})),
            DecisionVerdict {
                should_retry: true,
                delay: 0
            }
        );
        assert!(!resolve(json!({"delay": 10})).should_retry);
    }

    #[test]
    fn null_and_wrong_types_use_defaults() {
        assert_eq!(
            resolve(json!({"should_retry": null, "delay": null})),
            DecisionVerdict::default()
        );
        assert!(!resolve(json!({"should_retry": 1})).should_retry);
        assert_eq!(resolve(json!({"should_retry": true, "delay": [1]})).delay, 0);
        assert_eq!(resolve(json!({"should_retry": true, "delay": "soon"})).delay, 0);
    }

    #[test]
    fn delay_is_floored_and_never_negative() {
        assert_eq!(resolve(json!({"delay": 2.9})).delay, 2);
        assert_eq!(resolve(json!({"delay": -5})).delay, 0);
        assert_eq!(resolve(json!({"delay": -0.5})).delay, 0);
        assert_eq!(resolve(json!({"delay": "7"})).delay, 7);
        assert_eq!(resolve(json!({"delay": "1.5"})).delay, 1);
        assert_eq!(resolve(json!({"delay": "-3"})).delay, 0);
    }

    #[test]
    fn string_booleans_are_accepted() {
        assert!(resolve(json!({"should_retry": "True"})).should_retry);
        assert!(!resolve(json!({"should_retry": "false"})).should_retry);
        assert!(!resolve(json!({"should_retry": "maybe"})).should_retry);
    }

    #[test]
    fn extra_fields_are_ignored() {
        let v = resolve(json!({"should_retry": true, "delay": 1, "reason": "flaky"}));
        assert_eq!(
            v,
            DecisionVerdict {
                should_retry: true,
                delay: 1
            }
        );
    }

    #[test]
    fn code_fences_are_stripped() {
        let text = "```json\n{\"should_retry\": true, \"delay\": 5}\n```";
        assert_eq!(RawVerdict::from_text(text).unwrap().resolve().delay, 5);
        let bare = "```{\"should_retry\": false}```";
        assert!(!RawVerdict::from_text(bare).unwrap().resolve().should_retry);
        let same_line = "```json {\"should_retry\": true, \"delay\": 2}```";
        assert_eq!(
            RawVerdict::from_text(same_line).unwrap().resolve(),
            DecisionVerdict {
                should_retry: true,
                delay: 2
            }
        );
    }

    #[test]
    fn non_object_output_is_malformed() {
        assert!(matches!(
            RawVerdict::from_text("sure, retry in 5 seconds"),
            Err(OracleError::MalformedVerdict(_))
        ));
        assert!(matches!(
            RawVerdict::from_text("[true, 5]"),
            Err(OracleError::MalformedVerdict(_))
        ));
        assert!(matches!(
            RawVerdict::from_text(""),
            Err(OracleError::MalformedVerdict(_))
        ));
    }

    #[test]
    fn new_and_from_verdict_agree() {
        let typed = DecisionVerdict {
            should_retry: true,
            delay: 9,
        };
        assert_eq!(RawVerdict::from(typed), RawVerdict::new(true, 9));
        assert_eq!(RawVerdict::from(typed).resolve(), typed);
    }
}
