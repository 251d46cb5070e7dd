//! Key-value assistant configuration (`/etc/ai/ai.conf`).
//!
//! Each line has the form `KEY=value`. `OPENAIKEY` is required and the first
//! occurrence wins. `PROMPT` and `ADDEDPROMPT` may repeat; their values are
//! joined with single spaces. Other lines are ignored.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/ai/ai.conf";

const API_KEY: &str = "OPENAIKEY";
const PROMPT: &str = "PROMPT";
const ADDED_PROMPT: &str = "ADDEDPROMPT";
const MODEL: &str = "MODEL";
const API_URL: &str = "APIURL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to open config file {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{key} not found in config file {}", .path.display())]
    MissingKey { key: &'static str, path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantConfig {
    pub api_key: String,
    pub prompt: Option<String>,
    pub added_prompt: Option<String>,
    pub model: Option<String>,
    pub api_url: Option<String>,
}

impl AssistantConfig {
    /// System messages that open every conversation, in order.
    pub fn system_prompts(&self) -> Vec<String> {
        self.prompt
            .iter()
            .chain(self.added_prompt.iter())
            .cloned()
            .collect()
    }
}

pub fn load_config(path: &Path) -> Result<AssistantConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&contents, path)
}

/// Parse config text; `path` is only used for error messages.
pub fn parse_config(contents: &str, path: &Path) -> Result<AssistantConfig, ConfigError> {
    let api_key = first_value(contents, API_KEY)
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .ok_or_else(|| ConfigError::MissingKey {
            key: API_KEY,
            path: path.to_path_buf(),
        })?;

    Ok(AssistantConfig {
        api_key,
        prompt: joined_values(contents, PROMPT),
        added_prompt: joined_values(contents, ADDED_PROMPT),
        model: first_value(contents, MODEL).map(|v| v.trim().to_string()),
        api_url: first_value(contents, API_URL).map(|v| v.trim().to_string()),
    })
}

fn values<'a>(contents: &'a str, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    contents.lines().filter_map(move |line| {
        let line = line.strip_suffix('\r').unwrap_or(line);
        line.strip_prefix(key)?.strip_prefix('=')
    })
}

fn first_value<'a>(contents: &'a str, key: &'a str) -> Option<&'a str> {
    values(contents, key).next()
}

fn joined_values(contents: &str, key: &str) -> Option<String> {
    let parts: Vec<&str> = values(contents, key).collect();
    if parts.is_empty() {
        tracing::debug!(key, "config key not present");
        return None;
    }
    Some(parts.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(contents: &str) -> Result<AssistantConfig, ConfigError> {
        parse_config(contents, Path::new("ai.conf"))
    }

    #[test]
    fn parses_key_and_multiline_prompts() {
        let config = parse(
            "# assistant\nOPENAIKEY=sk-test\nPROMPT=You are a Linux assistant.\n\
             PROMPT=Wrap commands in <CMD></CMD>.\nADDEDPROMPT=Be brief.\n",
        )
        .expect("parse");
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(
            config.prompt.as_deref(),
            Some("You are a Linux assistant. Wrap commands in <CMD></CMD>.")
        );
        assert_eq!(config.added_prompt.as_deref(), Some("Be brief."));
        assert_eq!(config.system_prompts().len(), 2);
    }

    #[test]
    fn prompt_key_does_not_match_added_prompt_lines() {
        let config = parse("OPENAIKEY=k\nADDEDPROMPT=extra\n").expect("parse");
        assert_eq!(config.prompt, None);
        assert_eq!(config.system_prompts(), vec!["extra".to_string()]);
    }

    #[test]
    fn first_api_key_wins_and_is_trimmed() {
        let config = parse("OPENAIKEY=first \r\nOPENAIKEY=second\n").expect("parse");
        assert_eq!(config.api_key, "first");
    }

    #[test]
    fn missing_api_key_is_an_error() {
        let err = parse("PROMPT=hello\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey { key: "OPENAIKEY", .. }));
        assert!(err.to_string().contains("OPENAIKEY not found"));
    }

    #[test]
    fn empty_api_key_is_an_error() {
        assert!(parse("OPENAIKEY=\n").is_err());
    }

    #[test]
    fn optional_model_and_url() {
        let config =
            parse("OPENAIKEY=k\nMODEL=gpt-4o-mini\nAPIURL=http://localhost:8080/v1\n")
                .expect("parse");
        assert_eq!(config.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(config.api_url.as_deref(), Some("http://localhost:8080/v1"));
    }

    #[test]
    fn load_missing_file_reports_path() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("ai.conf");
        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("failed to open config file"));
    }

    #[test]
    fn load_reads_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("ai.conf");
        fs::write(&path, "OPENAIKEY=sk-file\n").expect("write");
        assert_eq!(load_config(&path).expect("load").api_key, "sk-file");
    }
}
