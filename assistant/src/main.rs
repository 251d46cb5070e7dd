//! `ai`: ask a chat model for help and run the commands it proposes, one
//! approval at a time.
//!
//! ```text
//! ai please show me the largest files in /var/log
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::debug;

use assistant::core::conversation::Conversation;
use assistant::exit_codes;
use assistant::io::config::{DEFAULT_CONFIG_PATH, load_config};
use assistant::io::model::OpenAiClient;
use assistant::io::operator::TerminalOperator;
use assistant::io::sandbox::ShellExecutor;
use assistant::io::settings::{Settings, load_settings};
use assistant::logging;
use assistant::session::{Session, SessionEnd};

#[derive(Parser, Debug)]
#[command(
    name = "ai",
    version,
    about = "Shell assistant that runs model-proposed commands after approval"
)]
struct Cli {
    /// Key-value file with OPENAIKEY, PROMPT and ADDEDPROMPT.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Optional TOML file with model and execution settings.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Override the chat model.
    #[arg(long)]
    model: Option<String>,

    /// Enable debug diagnostics on stderr.
    #[arg(short, long)]
    verbose: bool,

    /// Opening message. Prompted for when omitted.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    words: Vec<String>,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    match run(cli) {
        Ok(end) => {
            debug!(?end, "exiting");
            std::process::exit(exit_codes::OK);
        }
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::FAILURE);
        }
    }
}

fn run(cli: Cli) -> Result<SessionEnd> {
    let config = load_config(&cli.config)?;
    let settings = resolve_settings(&cli, config.model.as_deref(), config.api_url.as_deref())?;

    let client = OpenAiClient::new(&config.api_key, &settings)?;
    let executor = ShellExecutor::new(
        Duration::from_secs(settings.command_timeout_secs),
        settings.output_limit_bytes,
    );
    let mut session = Session::new(
        client,
        TerminalOperator::stdio(),
        executor,
        Conversation::with_capacity(settings.max_conversation_entries),
    );
    session.run(&config.system_prompts(), &cli.words)
}

/// Settings file (or defaults), then `ai.conf` overrides, then CLI flags.
fn resolve_settings(
    cli: &Cli,
    conf_model: Option<&str>,
    conf_api_url: Option<&str>,
) -> Result<Settings> {
    let mut settings = match &cli.settings {
        Some(path) => load_settings(path)?,
        None => Settings::default(),
    };
    if let Some(model) = conf_model {
        settings.model = model.to_string();
    }
    if let Some(api_url) = conf_api_url {
        settings.api_url = api_url.to_string();
    }
    if let Some(model) = &cli.model {
        settings.model = model.clone();
    }
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_words_as_opening_message() {
        let cli = Cli::parse_from(["ai", "please", "echo", "Hello", "world", "!"]);
        assert_eq!(cli.words.join(" "), "please echo Hello world !");
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_PATH));
        assert!(!cli.verbose);
    }

    #[test]
    fn flags_before_words_are_options() {
        let cli = Cli::parse_from(["ai", "--model", "gpt-4o-mini", "-v", "list", "-la", "files"]);
        assert_eq!(cli.model.as_deref(), Some("gpt-4o-mini"));
        assert!(cli.verbose);
        assert_eq!(cli.words, vec!["list", "-la", "files"]);
    }

    #[test]
    fn no_words_means_interactive() {
        let cli = Cli::parse_from(["ai"]);
        assert!(cli.words.is_empty());
    }

    #[test]
    fn cli_model_overrides_conf_model() {
        let cli = Cli::parse_from(["ai", "--model", "from-cli"]);
        let settings = resolve_settings(&cli, Some("from-conf"), None).expect("settings");
        assert_eq!(settings.model, "from-cli");

        let cli = Cli::parse_from(["ai"]);
        let settings = resolve_settings(&cli, Some("from-conf"), Some("http://localhost:1/v1"))
            .expect("settings");
        assert_eq!(settings.model, "from-conf");
        assert_eq!(settings.api_url, "http://localhost:1/v1");
    }
}
