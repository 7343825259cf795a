//! Chat command - stream chat completions.

use anyhow::Result;
use clap::Args;
use futures::StreamExt;
use gateway_core::{ChatMessage, ProviderConfig};
use gateway_providers::Gateway;
use serde::Serialize;
use std::io::{self, BufRead, Write};
use tokio_util::sync::CancellationToken;

use crate::output::{self, CommandResult, OutputFormat};
use crate::settings::ConfigSource;

/// Arguments for the chat command.
#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Message to send (if not provided, reads from stdin)
    #[arg(short = 'M', long)]
    pub message: Option<String>,

    /// System prompt
    #[arg(short, long)]
    pub system: Option<String>,

    /// Interactive chat mode
    #[arg(short, long)]
    pub interactive: bool,

    /// Verify first and switch to a served model if needed
    #[arg(long)]
    pub auto_model: bool,
}

/// Chat response for output.
#[derive(Debug, Serialize)]
pub struct ChatOutput {
    pub provider: String,
    pub model: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub cancelled: bool,
}

/// Outcome of one streamed turn.
#[derive(Debug, Default)]
struct Turn {
    content: String,
    error: Option<String>,
    cancelled: bool,
}

/// Execute the chat command.
pub async fn execute(args: ChatArgs, source: &ConfigSource, json: bool) -> Result<()> {
    let format = OutputFormat::from_json_flag(json);
    let config = source.load().await?;
    let gateway = config.build_gateway()?;

    let provider = if args.auto_model {
        let (probe, selected) = gateway.verify_and_select_model(&config.provider).await;
        if !probe.success && format == OutputFormat::Text {
            output::warning(&probe.message);
        }
        selected
    } else {
        config.provider.clone()
    };

    if args.interactive {
        run_interactive_mode(&gateway, &provider, &args).await
    } else {
        run_single_message(&gateway, &provider, &args, format).await
    }
}

/// Run a single message chat.
async fn run_single_message(
    gateway: &Gateway,
    provider: &ProviderConfig,
    args: &ChatArgs,
    format: OutputFormat,
) -> Result<()> {
    let message = if let Some(ref msg) = args.message {
        msg.clone()
    } else {
        let mut input = String::new();
        io::stdin().lock().read_line(&mut input)?;
        input.trim().to_string()
    };

    if message.is_empty() {
        let result: CommandResult<()> = CommandResult::failure("No message provided");
        result.print(format)?;
        return Ok(());
    }

    let mut messages = Vec::new();
    if let Some(ref system) = args.system {
        messages.push(ChatMessage::system(system));
    }
    messages.push(ChatMessage::user(message));

    let echo = format == OutputFormat::Text;
    let turn = stream_turn(gateway, provider, &messages, echo).await;

    match format {
        OutputFormat::Json => {
            let data = ChatOutput {
                provider: provider.provider.to_string(),
                model: provider.effective_model().to_string(),
                content: turn.content,
                error: turn.error.clone(),
                cancelled: turn.cancelled,
            };
            let result = match turn.error {
                Some(error) => CommandResult::failure(error).with_data(data),
                None => CommandResult::success(data),
            };
            result.print(format)?;
        }
        OutputFormat::Text => {
            output::stream_newline();
            if turn.cancelled {
                output::warning("Cancelled");
            }
        }
    }

    Ok(())
}

/// Run an interactive session, keeping the conversation history.
async fn run_interactive_mode(gateway: &Gateway, provider: &ProviderConfig, args: &ChatArgs) -> Result<()> {
    output::info(&format!(
        "Chatting with {} ({}). Empty line or /exit to quit, Ctrl-C stops a reply.",
        provider.provider,
        provider.effective_model()
    ));

    let mut messages = Vec::new();
    if let Some(ref system) = args.system {
        messages.push(ChatMessage::system(system));
    }

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();
        if input.is_empty() || input == "/exit" {
            break;
        }

        messages.push(ChatMessage::user(input));
        let turn = stream_turn(gateway, provider, &messages, true).await;
        output::stream_newline();

        if turn.cancelled {
            output::warning("Cancelled");
        }
        if turn.error.is_some() || turn.content.is_empty() {
            // Keep the history valid for the next attempt.
            messages.pop();
        } else {
            messages.push(ChatMessage::assistant(turn.content));
        }
    }

    Ok(())
}

/// Stream one reply, cancelling on Ctrl-C.
async fn stream_turn(
    gateway: &Gateway,
    provider: &ProviderConfig,
    messages: &[ChatMessage],
    echo: bool,
) -> Turn {
    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let mut turn = Turn::default();
    let mut stream = gateway.stream(provider, messages, cancel.clone());

    while let Some(fragment) = stream.next().await {
        if echo {
            output::stream_text(fragment.as_str());
        }
        if fragment.is_error() {
            let text = fragment.into_string();
            turn.error = Some(
                text.trim_start_matches("\n[Error: ")
                    .trim_end_matches(']')
                    .to_string(),
            );
        } else {
            turn.content.push_str(fragment.as_str());
        }
    }

    turn.cancelled = cancel.is_cancelled();
    interrupt.abort();
    turn
}
