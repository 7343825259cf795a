//! Models command - list the models a provider serves.

use anyhow::Result;
use clap::Args;
use gateway_providers::Gateway;
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, CommandResult, OutputFormat};
use crate::settings::ConfigSource;

/// Arguments for the models command.
#[derive(Args, Debug)]
pub struct ModelsArgs {
    /// Filter models by name substring
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Show suggested models without contacting the provider
    #[arg(long)]
    pub known: bool,
}

/// Model information for table display.
#[derive(Debug, Tabled, Serialize)]
pub struct ModelRow {
    #[tabled(rename = "Model")]
    pub name: String,
    #[tabled(rename = "Selected")]
    #[serde(skip)]
    pub marker: String,
    #[tabled(skip)]
    pub selected: bool,
}

/// Execute the models command.
pub async fn execute(args: ModelsArgs, source: &ConfigSource, json: bool) -> Result<()> {
    let format = OutputFormat::from_json_flag(json);
    let config = source.load().await?;

    let (names, current) = if args.known {
        let names = Gateway::known_models(config.provider.provider)
            .iter()
            .map(|name| (*name).to_string())
            .collect();
        (names, config.provider.effective_model().to_string())
    } else {
        let gateway = config.build_gateway()?;
        let spinner = (format == OutputFormat::Text).then(|| output::spinner("Fetching models..."));
        let (probe, selected) = gateway.verify_and_select_model(&config.provider).await;
        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }

        if !probe.success {
            CommandResult::<Vec<ModelRow>>::failure(probe.message).print(format)?;
            std::process::exit(1);
        }

        (
            probe.models.unwrap_or_default(),
            selected.effective_model().to_string(),
        )
    };

    let rows = model_rows(names, &current, args.filter.as_deref());

    match format {
        OutputFormat::Json => CommandResult::success(rows).print(format)?,
        OutputFormat::Text => {
            output::table(&rows);
            output::key_value("Total", &rows.len().to_string());
        }
    }

    Ok(())
}

/// Filter names and mark the selected one.
fn model_rows(names: Vec<String>, current: &str, filter: Option<&str>) -> Vec<ModelRow> {
    let filter = filter.map(str::to_lowercase);
    names
        .into_iter()
        .filter(|name| {
            filter
                .as_deref()
                .map_or(true, |f| name.to_lowercase().contains(f))
        })
        .map(|name| {
            let selected = name == current;
            ModelRow {
                marker: if selected { "●".to_string() } else { String::new() },
                selected,
                name,
            }
        })
        .collect()
}
