//! # LLM Provider Gateway
//!
//! Headless connection watcher for the configured LLM provider.
//!
//! Verifies the provider once, adopts a served model when the configured one
//! is missing, then keeps the connection status current until interrupted.
//!
//! ## Usage
//!
//! ```bash
//! # Watch the local model server with defaults
//! llm-provider-gateway
//!
//! # Use a configuration file
//! llm-provider-gateway /path/to/gateway.toml
//!
//! # Override the provider from the environment
//! GATEWAY_PROVIDER=groq GATEWAY_API_KEY=gsk-... llm-provider-gateway
//! ```

use anyhow::{Context, Result};
use gateway_config::{GatewayConfig, LogFormat, LogSettings};
use gateway_providers::ConnectionMonitor;
use gateway_telemetry::{init_logging, LogOutput, LoggingConfig};
use std::env;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// Application entry point
#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        // Logging may not be up if configuration failed.
        eprintln!("llm-provider-gateway: {e:#}");
        error!(error = %e, "Application failed");
        std::process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    let path = env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| env::var_os("GATEWAY_CONFIG").map(PathBuf::from));

    let config = GatewayConfig::load(path.as_deref()).context("Failed to load configuration")?;
    init_logging(&logging_config(&config.logging))?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        provider = %config.provider.provider,
        model = %config.provider.effective_model(),
        "Starting LLM provider gateway"
    );

    let gateway = config.build_gateway()?;

    let (probe, provider) = gateway.verify_and_select_model(&config.provider).await;
    if probe.success {
        info!(message = %probe.message, model = %provider.effective_model(), "Provider verified");
    } else {
        warn!(message = %probe.message, "Provider verification failed");
    }

    if !config.monitor.enabled {
        return Ok(());
    }

    let monitor = ConnectionMonitor::start(gateway, provider, config.monitor.interval);
    let mut status = monitor.subscribe();

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                info!("Shutdown signal received");
                break;
            }
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *status.borrow_and_update();
                info!(status = %current, "Connection status changed");
            }
        }
    }

    monitor.shutdown().await;
    Ok(())
}

/// Map file logging settings onto the subscriber configuration.
fn logging_config(settings: &LogSettings) -> LoggingConfig {
    let format = match settings.format {
        LogFormat::Pretty => LogOutput::Pretty,
        LogFormat::Json => LogOutput::Json,
    };

    LoggingConfig::new(&settings.level)
        .with_format(format)
        .with_target(settings.with_target)
}
