//! Verify command - probe the configured provider.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::output::{self, CommandResult, OutputFormat};
use crate::settings::ConfigSource;

/// Arguments for the verify command.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Also print the model the gateway would select
    #[arg(long)]
    pub select_model: bool,
}

/// Verification output for JSON.
#[derive(Debug, Serialize)]
pub struct VerifyOutput {
    pub provider: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub models: Option<Vec<String>>,
    pub model: String,
}

/// Execute the verify command.
pub async fn execute(args: VerifyArgs, source: &ConfigSource, json: bool) -> Result<()> {
    let format = OutputFormat::from_json_flag(json);
    let config = source.load().await?;
    let gateway = config.build_gateway()?;

    let spinner = (format == OutputFormat::Text)
        .then(|| output::spinner(&format!("Verifying {} connection...", config.provider.provider)));
    let (probe, selected) = gateway.verify_and_select_model(&config.provider).await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    let data = VerifyOutput {
        provider: config.provider.provider.to_string(),
        message: probe.message.clone(),
        models: probe.models.clone(),
        model: selected.effective_model().to_string(),
    };

    match format {
        OutputFormat::Json => {
            let result = if probe.success {
                CommandResult::success(data)
            } else {
                CommandResult::failure(probe.message.clone()).with_data(data)
            };
            result.print(format)?;
        }
        OutputFormat::Text => {
            output::probe(&probe);
            if let Some(models) = &probe.models {
                output::key_value("Models", &models.len().to_string());
            }
            if args.select_model {
                output::key_value("Model", selected.effective_model());
                if selected.model_name != config.provider.model_name {
                    output::warning(&format!(
                        "'{}' is not served; '{}' would be used instead",
                        config.provider.effective_model(),
                        selected.effective_model()
                    ));
                }
            }
        }
    }

    if !probe.success {
        std::process::exit(1);
    }
    Ok(())
}
