//! Config command - manage gateway configuration.

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use gateway_config::{FileFormat, GatewayConfig};
use gateway_core::ConfigStore;
use serde::Serialize;
use std::path::PathBuf;

use crate::output::{self, CommandResult, OutputFormat};
use crate::settings::{config_dir, ConfigSource};

/// Placeholder shown instead of the API key.
const REDACTED: &str = "********";

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show(ShowArgs),

    /// Generate a sample configuration file
    Init(InitArgs),

    /// Save the provider flags as the default provider
    Set,

    /// Check the effective configuration
    Validate,

    /// Print configuration paths
    Path,
}

/// Arguments for config show.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Print the API key instead of redacting it
    #[arg(long)]
    pub reveal: bool,
}

/// Arguments for config init.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Output file path; the extension picks the format
    #[arg(short, long, default_value = "gateway.toml")]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

/// Configuration paths for JSON.
#[derive(Debug, Serialize)]
pub struct PathOutput {
    pub config_dir: Option<String>,
    pub settings_file: Option<String>,
    pub provider_file: Option<String>,
}

/// Execute the config command.
pub async fn execute(args: ConfigArgs, source: &ConfigSource, json: bool) -> Result<()> {
    let format = OutputFormat::from_json_flag(json);

    match args.command {
        ConfigCommand::Show(show) => show_config(source, &show, format).await,
        ConfigCommand::Init(init) => init_config(&init, format),
        ConfigCommand::Set => set_provider(source, format).await,
        ConfigCommand::Validate => validate_config(source, format).await,
        ConfigCommand::Path => show_paths(source, format),
    }
}

async fn show_config(source: &ConfigSource, args: &ShowArgs, format: OutputFormat) -> Result<()> {
    let config = source.load().await?;
    let view = redacted_view(&config, args.reveal)?;

    match format {
        OutputFormat::Json => CommandResult::success(view).print(format),
        OutputFormat::Text => {
            if let Some(path) = source.settings_path() {
                output::info(&format!("Settings file: {}", path.display()));
            }

            let provider = &config.provider;
            output::section("Provider");
            output::key_value("Provider", provider.provider.as_str());
            output::key_value("Model", provider.effective_model());
            output::key_value("Base URL", provider.base_url().unwrap_or("-"));
            let key = match provider.api_key() {
                Some(key) if args.reveal => key.to_string(),
                Some(_) => REDACTED.to_string(),
                None => "-".to_string(),
            };
            output::key_value("API key", &key);

            output::section("Client");
            output::key_value("Page secure", &config.client.page_secure.to_string());
            output::key_value(
                "Request timeout",
                &config
                    .client
                    .request_timeout
                    .map_or_else(|| "none".to_string(), output::format_duration),
            );
            output::key_value("Connect timeout", &output::format_duration(config.client.connect_timeout));
            output::key_value(
                "Local probe timeout",
                &output::format_duration(config.client.local_probe_timeout),
            );

            output::section("Monitor");
            output::key_value("Enabled", &config.monitor.enabled.to_string());
            output::key_value("Interval", &output::format_duration(config.monitor.interval));

            output::section("Logging");
            output::key_value("Level", &config.logging.level);
            output::key_value("Format", &format!("{:?}", config.logging.format).to_lowercase());
            Ok(())
        }
    }
}

/// Configuration as JSON with the API key hidden unless `reveal` is set.
fn redacted_view(config: &GatewayConfig, reveal: bool) -> Result<serde_json::Value> {
    let mut view = serde_json::to_value(config)?;
    if !reveal {
        if let Some(key) = view.pointer_mut("/provider/api_key") {
            *key = serde_json::Value::String(REDACTED.to_string());
        }
    }
    Ok(view)
}

fn init_config(args: &InitArgs, format: OutputFormat) -> Result<()> {
    if args.output.exists() && !args.force {
        bail!(
            "{} already exists. Use --force to overwrite.",
            args.output.display()
        );
    }

    let file_format = FileFormat::from_path(&args.output)?;
    let rendered = file_format.render(&GatewayConfig::default())?;
    std::fs::write(&args.output, rendered)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    let result: CommandResult<()> =
        CommandResult::success_message(format!("Wrote {}", args.output.display()));
    result.print(format)
}

async fn set_provider(source: &ConfigSource, format: OutputFormat) -> Result<()> {
    let config = source.load().await?;
    let Some(store) = source.provider_store() else {
        bail!("No configuration directory available on this system");
    };

    store.save(&config.provider).await?;

    let result: CommandResult<()> = CommandResult::success_message(format!(
        "Saved {} ({}) to {}",
        config.provider.provider,
        config.provider.effective_model(),
        store.path().display()
    ));
    result.print(format)
}

async fn validate_config(source: &ConfigSource, format: OutputFormat) -> Result<()> {
    let config = match source.load().await {
        Ok(config) => config,
        Err(err) => {
            let result: CommandResult<()> = CommandResult::failure(format!("{err:#}"));
            result.print(format)?;
            std::process::exit(1);
        }
    };

    let result: CommandResult<()> = CommandResult::success_message("Configuration is valid");
    result.print(format)?;

    // Credentials are reported, not rejected; verify fails on them later.
    if let Err(err) = config.provider.validate() {
        if format == OutputFormat::Text {
            output::warning(&err.user_message());
        }
    }
    Ok(())
}

fn show_paths(source: &ConfigSource, format: OutputFormat) -> Result<()> {
    let paths = PathOutput {
        config_dir: config_dir().map(|dir| dir.display().to_string()),
        settings_file: source.settings_path().map(|path| path.display().to_string()),
        provider_file: source
            .provider_store()
            .map(|store| store.path().display().to_string()),
    };

    match format {
        OutputFormat::Json => CommandResult::success(paths).print(format),
        OutputFormat::Text => {
            output::key_value("Config directory", paths.config_dir.as_deref().unwrap_or("-"));
            output::key_value("Settings file", paths.settings_file.as_deref().unwrap_or("(none)"));
            output::key_value("Saved provider", paths.provider_file.as_deref().unwrap_or("-"));
            Ok(())
        }
    }
}
