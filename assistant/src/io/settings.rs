//! Optional TOML tunables for the model call and command execution.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::conversation::MAX_CONVERSATION_ENTRIES;
use crate::io::process::{DEFAULT_COMMAND_TIMEOUT, DEFAULT_OUTPUT_LIMIT_BYTES};

pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Assistant settings (TOML).
///
/// Missing fields default to the values the assistant has always used.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Chat model identifier.
    pub model: String,

    /// Chat-completions endpoint.
    pub api_url: String,

    pub temperature: f32,

    /// Upper bound on tokens in each model reply.
    pub max_tokens: u32,

    /// Wall-clock budget for one model request.
    pub request_timeout_secs: u64,

    /// Wall-clock budget for one approved command.
    pub command_timeout_secs: u64,

    /// Captured stdout beyond this many bytes is discarded.
    pub output_limit_bytes: usize,

    pub max_conversation_entries: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            temperature: 0.0,
            max_tokens: 500,
            request_timeout_secs: 120,
            command_timeout_secs: DEFAULT_COMMAND_TIMEOUT.as_secs(),
            output_limit_bytes: DEFAULT_OUTPUT_LIMIT_BYTES,
            max_conversation_entries: MAX_CONVERSATION_ENTRIES,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(anyhow!("model must be non-empty"));
        }
        if self.api_url.trim().is_empty() {
            return Err(anyhow!("api_url must be non-empty"));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(anyhow!("temperature must be within 0.0..=2.0"));
        }
        if self.max_tokens == 0 {
            return Err(anyhow!("max_tokens must be > 0"));
        }
        if self.request_timeout_secs == 0 {
            return Err(anyhow!("request_timeout_secs must be > 0"));
        }
        if self.command_timeout_secs == 0 {
            return Err(anyhow!("command_timeout_secs must be > 0"));
        }
        if self.output_limit_bytes == 0 {
            return Err(anyhow!("output_limit_bytes must be > 0"));
        }
        if self.max_conversation_entries == 0 {
            return Err(anyhow!("max_conversation_entries must be > 0"));
        }
        Ok(())
    }
}

/// Load settings from a TOML file.
///
/// If the file is missing, returns `Settings::default()`.
pub fn load_settings(path: &Path) -> Result<Settings> {
    if !path.exists() {
        let settings = Settings::default();
        settings.validate()?;
        return Ok(settings);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let settings: Settings =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let settings = load_settings(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.command_timeout_secs, 60);
        assert_eq!(settings.max_tokens, 500);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("settings.toml");
        fs::write(&path, "model = \"gpt-4o-mini\"\ncommand_timeout_secs = 5\n").expect("write");

        let settings = load_settings(&path).expect("load");
        assert_eq!(settings.model, "gpt-4o-mini");
        assert_eq!(settings.command_timeout_secs, 5);
        assert_eq!(settings.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("settings.toml");
        fs::write(&path, "command_timeout_secs = 0\n").expect("write");

        let err = load_settings(&path).unwrap_err();
        assert!(err.to_string().contains("command_timeout_secs"));
    }
}
