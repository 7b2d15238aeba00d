//! Pulling JSON out of model replies.

use regex::Regex;
use serde::de::DeserializeOwned;
use std::sync::OnceLock;

use scribe_core::error::{Result, ScribeError};

fn fence_regex() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?s)```(?:json|JSON)?\s*\n?(.*?)```").expect("fence pattern is valid")
    })
}

/// Returns the JSON payload of a reply: the body of the first code fence if
/// there is one, otherwise the span from the first `{`/`[` to the last
/// `}`/`]`.
pub fn extract_json(raw: &str) -> Option<&str> {
    if let Some(body) = fence_regex()
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|body| !body.is_empty())
    {
        return Some(body);
    }

    let start = raw.find(['{', '['])?;
    let end = raw.rfind(['}', ']'])?;
    (end >= start).then(|| raw[start..=end].trim())
}

/// Extracts and deserializes the JSON payload of a reply.
pub fn parse_reply<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let json = extract_json(raw).ok_or_else(|| {
        ScribeError::remote(format!("model reply contains no JSON: {}", preview(raw)))
    })?;
    serde_json::from_str(json).map_err(|e| {
        ScribeError::remote(format!("model reply is not the expected JSON ({e}): {}", preview(json)))
    })
}

fn preview(text: &str) -> String {
    const MAX: usize = 120;
    let mut preview: String = text.chars().take(MAX).collect();
    if text.chars().count() > MAX {
        preview.push_str("...");
    }
    preview
}
