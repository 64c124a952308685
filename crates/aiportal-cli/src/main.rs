//! AI Portal CLI — entry point.
//!
//! # Commands
//!
//! - `aiportal chat [-m MODEL] [-s SYSTEM] PROMPT` — one prompt, one answer
//! - `aiportal repl [-m MODEL]` — interactive chat
//! - `aiportal models` — models usable with the current credentials
//! - `aiportal status` — configuration and provider status
//! - `aiportal init` — write a default config file

mod helpers;
mod init;
mod repl;
mod status;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use aiportal_core::config::{load_config, Config};
use aiportal_providers::Dispatcher;

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// AI Portal — one prompt interface over OpenAI, Anthropic, Google, Groq, OpenRouter and Ollama
#[derive(Parser)]
#[command(name = "aiportal", version, about, long_about = None)]
struct Cli {
    /// Config file (default: ~/.aiportal/config.json)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a single prompt and print the answer
    Chat {
        /// The prompt text
        prompt: String,

        #[command(flatten)]
        opts: ChatOpts,

        /// Print the usage record as JSON instead of the plain answer
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Interactive chat session
    Repl {
        #[command(flatten)]
        opts: ChatOpts,
    },

    /// List models available with the configured providers
    Models {
        /// Use the built-in lists only (skip asking Ollama what is installed)
        #[arg(long, default_value_t = false)]
        offline: bool,
    },

    /// Show configuration and provider status
    Status,

    /// Create the config file with defaults
    Init,
}

#[derive(Args, Clone, Debug, Default)]
struct ChatOpts {
    /// Model identifier (e.g. gpt-4o, claude-3-5-haiku-20241022, ollama/llama3.2)
    #[arg(short, long)]
    model: Option<String>,

    /// System prompt
    #[arg(short, long)]
    system: Option<String>,

    /// Maximum tokens to generate
    #[arg(long)]
    max_tokens: Option<u32>,

    /// Sampling temperature (0.0 – 2.0)
    #[arg(short, long)]
    temperature: Option<f64>,

    /// Enable debug logging
    #[arg(long, default_value_t = false)]
    logs: bool,
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref().map(helpers::expand_tilde);

    match cli.command {
        Commands::Chat { prompt, opts, json } => {
            init_logging(opts.logs);
            run_chat(config_path, &prompt, &opts, json).await
        }
        Commands::Repl { opts } => {
            init_logging(opts.logs);
            let config = load_config(config_path.as_deref());
            repl::run(Dispatcher::from_config(&config), opts).await
        }
        Commands::Models { offline } => {
            init_logging(false);
            run_models(config_path, offline).await
        }
        Commands::Status => status::run(config_path),
        Commands::Init => init::run(config_path),
    }
}

// ─────────────────────────────────────────────
// Chat command
// ─────────────────────────────────────────────

async fn run_chat(
    config_path: Option<PathBuf>,
    prompt: &str,
    opts: &ChatOpts,
    json: bool,
) -> Result<()> {
    let config = load_config(config_path.as_deref());
    let dispatcher = Dispatcher::from_config(&config);
    let request = opts.apply(dispatcher.new_request(prompt));

    info!(model = ?request.model, "processing single prompt");
    let outcome = dispatcher
        .complete(&request)
        .await
        .context("chat failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome.record)?);
    } else {
        helpers::print_response(&outcome.response);
        helpers::print_usage(&outcome.record);
    }
    Ok(())
}

impl ChatOpts {
    /// Layer command-line choices over the configured defaults.
    fn apply(&self, mut request: aiportal_core::CanonicalChatRequest) -> aiportal_core::CanonicalChatRequest {
        if let Some(ref model) = self.model {
            request.model = Some(model.clone());
        }
        if let Some(ref system) = self.system {
            request.system_prompt = Some(system.clone());
        }
        if let Some(max_tokens) = self.max_tokens {
            request.max_output_tokens = max_tokens;
        }
        if let Some(temperature) = self.temperature {
            request.temperature = temperature;
        }
        request
    }
}

// ─────────────────────────────────────────────
// Models command
// ─────────────────────────────────────────────

async fn run_models(config_path: Option<PathBuf>, offline: bool) -> Result<()> {
    let config = load_config(config_path.as_deref());
    let models = available_models(&config, offline).await;
    for model in models {
        println!("{model}");
    }
    Ok(())
}

async fn available_models(config: &Config, offline: bool) -> Vec<String> {
    let catalog = Dispatcher::from_config(config).catalog();
    if offline {
        catalog.list_available_models()
    } else {
        catalog.discover_available_models().await
    }
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("aiportal=debug,info")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_chat_with_options() {
        let cli = Cli::try_parse_from([
            "aiportal", "chat", "-m", "ollama/llama3.2", "-s", "Be brief.", "--max-tokens", "64", "hi there",
        ])
        .unwrap();
        match cli.command {
            Commands::Chat { prompt, opts, json } => {
                assert_eq!(prompt, "hi there");
                assert_eq!(opts.model.as_deref(), Some("ollama/llama3.2"));
                assert_eq!(opts.system.as_deref(), Some("Be brief."));
                assert_eq!(opts.max_tokens, Some(64));
                assert!(!json);
            }
            _ => panic!("expected chat"),
        }
    }

    #[test]
    fn cli_global_config_flag() {
        let cli = Cli::try_parse_from(["aiportal", "status", "--config", "/tmp/x.json"]).unwrap();
        assert_eq!(cli.config.as_deref(), Some("/tmp/x.json"));
    }

    #[test]
    fn chat_opts_override_defaults() {
        let opts = ChatOpts {
            model: Some("gemini-1.5-pro".into()),
            temperature: Some(0.1),
            ..Default::default()
        };
        let base = aiportal_core::CanonicalChatRequest::new("q").with_max_output_tokens(300);
        let request = opts.apply(base);
        assert_eq!(request.model.as_deref(), Some("gemini-1.5-pro"));
        assert_eq!(request.temperature, 0.1);
        assert_eq!(request.max_output_tokens, 300);
        assert!(request.system_prompt.is_none());
    }

    #[tokio::test]
    async fn models_without_credentials_is_fallback() {
        let models = available_models(&Config::default(), true).await;
        assert_eq!(models, vec![aiportal_providers::FALLBACK_MODEL.to_string()]);
    }
}
