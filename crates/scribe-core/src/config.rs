//! Configuration types for Scribe.
//!
//! The root type is stored as `config.toml` in the Scribe config directory.
//! Every section has serde defaults so a partial file is always valid.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Result, ScribeError};

pub const DEFAULT_LANGUAGE: &str = "en-US";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Root configuration.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ScribeConfig {
    pub capture: CaptureConfig,
    pub history: HistoryConfig,
    pub autosave: AutosaveConfig,
    pub gemini: GeminiConfig,
}

impl ScribeConfig {
    /// Keys accepted by [`set_value`](Self::set_value).
    pub const KEYS: &'static [&'static str] = &[
        "capture.language",
        "capture.restart_delay_ms",
        "capture.interim_results",
        "history.max_depth",
        "autosave.debounce_ms",
        "gemini.api_key",
        "gemini.model",
        "gemini.base_url",
    ];

    /// Sets one setting from its dotted key and textual value.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "capture.language" => self.capture.language = non_empty(key, value)?,
            "capture.restart_delay_ms" => self.capture.restart_delay_ms = parse(key, value)?,
            "capture.interim_results" => self.capture.interim_results = parse(key, value)?,
            "history.max_depth" => self.history.max_depth = parse(key, value)?,
            "autosave.debounce_ms" => self.autosave.debounce_ms = parse(key, value)?,
            "gemini.api_key" => self.gemini.api_key = value.to_string(),
            "gemini.model" => self.gemini.model = non_empty(key, value)?,
            "gemini.base_url" => self.gemini.base_url = non_empty(key, value)?,
            _ => {
                return Err(ScribeError::config(format!(
                    "unknown setting '{}' (expected one of: {})",
                    key,
                    Self::KEYS.join(", ")
                )));
            }
        }
        Ok(())
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| ScribeError::config(format!("invalid value '{}' for {}", value, key)))
}

fn non_empty(key: &str, value: &str) -> Result<String> {
    if value.is_empty() {
        return Err(ScribeError::config(format!("{} must not be empty", key)));
    }
    Ok(value.to_string())
}

/// Speech capture settings.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CaptureConfig {
    /// BCP-47 language tag handed to the recognizer and the diarizer
    pub language: String,
    /// Delay before resuming after a spontaneous end of the native session
    pub restart_delay_ms: u64,
    /// Whether the recognizer should report interim (non-final) results
    pub interim_results: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            restart_delay_ms: 250,
            interim_results: true,
        }
    }
}

impl CaptureConfig {
    pub fn restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay_ms)
    }
}

/// Undo history settings.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of snapshots kept; `0` keeps everything
    pub max_depth: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_depth: 100 }
    }
}

/// Autosave settings.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AutosaveConfig {
    /// Quiet period after the last edit before the session is written
    pub debounce_ms: u64,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self { debounce_ms: 1500 }
    }
}

impl AutosaveConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Gemini API settings used by the diarizer and the assistant.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
        }
    }
}

impl GeminiConfig {
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ScribeConfig = toml::from_str(
            r#"
            [capture]
            language = "ja-JP"

            [autosave]
            debounce_ms = 500
            "#,
        )
        .unwrap();

        assert_eq!(config.capture.language, "ja-JP");
        assert_eq!(config.capture.restart_delay_ms, 250);
        assert!(config.capture.interim_results);
        assert_eq!(config.autosave.debounce(), Duration::from_millis(500));
        assert_eq!(config.history.max_depth, 100);
        assert_eq!(config.gemini.model, DEFAULT_GEMINI_MODEL);
        assert!(!config.gemini.has_api_key());
    }

    #[test]
    fn test_set_value() {
        let mut config = ScribeConfig::default();
        config.set_value("capture.language", " de-DE ").unwrap();
        config.set_value("capture.interim_results", "false").unwrap();
        config.set_value("autosave.debounce_ms", "300").unwrap();
        config.set_value("gemini.api_key", "").unwrap();

        assert_eq!(config.capture.language, "de-DE");
        assert!(!config.capture.interim_results);
        assert_eq!(config.autosave.debounce_ms, 300);
    }

    #[test]
    fn test_set_value_rejects_bad_input() {
        let mut config = ScribeConfig::default();
        assert!(matches!(
            config.set_value("history.max_depth", "many"),
            Err(ScribeError::Config(_))
        ));
        assert!(config.set_value("gemini.model", "  ").is_err());
        assert!(config.set_value("capture.volume", "11").is_err());
        assert_eq!(config, ScribeConfig::default());
    }

    #[test]
    fn test_roundtrip_default() {
        let config = ScribeConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: ScribeConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
