//! CLI argument definitions using clap.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use gateway_core::ProviderKind;
use std::path::PathBuf;

use crate::commands;

/// LLM Gateway - one interface over local and hosted LLM providers
#[derive(Parser, Debug)]
#[command(name = "llm-gateway")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long, env = "GATEWAY_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub provider: ProviderArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Provider settings that override the configuration file and environment.
#[derive(Args, Debug, Clone, Default)]
pub struct ProviderArgs {
    /// Provider (local, openai, anthropic, gemini, groq, custom)
    #[arg(short, long, global = true)]
    pub provider: Option<ProviderKind>,

    /// Model name
    #[arg(short = 'm', long, global = true)]
    pub model: Option<String>,

    /// Base URL for local and custom providers
    #[arg(short = 'u', long, global = true)]
    pub base_url: Option<String>,

    /// API key
    #[arg(short = 'k', long, global = true)]
    pub api_key: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check that the configured provider is reachable
    #[command(visible_alias = "check")]
    Verify(commands::verify::VerifyArgs),

    /// List the models the provider serves
    Models(commands::models::ModelsArgs),

    /// Stream a chat completion
    Chat(commands::chat::ChatArgs),

    /// Manage gateway configuration
    Config(commands::config::ConfigArgs),

    /// Watch the connection status
    Monitor(commands::monitor::MonitorArgs),

    /// Generate shell completions
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command.
    pub async fn execute(self) -> Result<()> {
        let source = crate::settings::ConfigSource {
            path: self.config,
            overrides: self.provider,
        };

        match self.command {
            Commands::Verify(args) => commands::verify::execute(args, &source, self.json).await,
            Commands::Models(args) => commands::models::execute(args, &source, self.json).await,
            Commands::Chat(args) => commands::chat::execute(args, &source, self.json).await,
            Commands::Config(args) => commands::config::execute(args, &source, self.json).await,
            Commands::Monitor(args) => commands::monitor::execute(args, &source, self.json).await,
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}
