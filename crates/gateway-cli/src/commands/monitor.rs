//! Monitor command - watch the connection status until interrupted.

use anyhow::Result;
use clap::Args;
use gateway_core::{ConnectionStatus, ProviderKind};
use gateway_providers::ConnectionMonitor;
use serde::Serialize;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::output::{self, OutputFormat};
use crate::settings::ConfigSource;

/// Arguments for the monitor command.
#[derive(Args, Debug)]
pub struct MonitorArgs {
    /// Poll interval for the local provider (e.g. 10s, 1m)
    #[arg(short, long, value_parser = humantime::parse_duration)]
    pub interval: Option<Duration>,
}

/// One status change for JSON output.
#[derive(Debug, Serialize)]
pub struct StatusEvent {
    pub provider: ProviderKind,
    pub status: ConnectionStatus,
}

/// Execute the monitor command.
pub async fn execute(args: MonitorArgs, source: &ConfigSource, json: bool) -> Result<()> {
    let format = OutputFormat::from_json_flag(json);
    let config = source.load().await?;
    let gateway = config.build_gateway()?;
    let interval = args.interval.unwrap_or(config.monitor.interval);
    let provider = config.provider.provider;

    if format == OutputFormat::Text {
        let schedule = if provider == ProviderKind::Local {
            format!("every {}", output::format_duration(interval))
        } else {
            "on demand".to_string()
        };
        output::info(&format!(
            "Monitoring {provider} ({schedule}). Press Enter to re-check, Ctrl-C to stop."
        ));
    }

    let monitor = ConnectionMonitor::start(gateway, config.provider, interval);
    let mut status = monitor.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    report(provider, *status.borrow_and_update(), format)?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                report(provider, *status.borrow_and_update(), format)?;
            }
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(_)) => monitor.check_now(),
                _ => stdin_open = false,
            },
        }
    }

    monitor.shutdown().await;
    Ok(())
}

fn report(provider: ProviderKind, status: ConnectionStatus, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => output::json_compact(&StatusEvent { provider, status }),
        OutputFormat::Text => {
            println!("{}", output::status_label(status));
            Ok(())
        }
    }
}
