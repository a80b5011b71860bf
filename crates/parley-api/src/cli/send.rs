//! `parley send`: one exchange without the interactive loop.

use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

use parley_core::chat::exchange::{ExchangeOutcome, IgnoreReason};

use crate::cli::chat::loop_runner::describe_balance;
use crate::cli::chat::renderer::ChatRenderer;
use crate::state::AppState;

pub async fn send_message(state: &AppState, text: &str, json: bool, quiet: bool) -> anyhow::Result<()> {
    state.start_balance_reflector();
    let spinner = (!json && !quiet).then(|| {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("  {spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(state.config.typing_indicator());
        spinner.enable_steady_tick(Duration::from_millis(80));
        spinner
    });

    let outcome = tokio::select! {
        outcome = state.exchange.send(text) => outcome,
        _ = tokio::signal::ctrl_c() => {
            if let Some(spinner) = &spinner {
                spinner.finish_and_clear();
            }
            // The outgoing message stays in history.
            anyhow::bail!("interrupted before a reply arrived");
        }
    };

    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    let balance = state.finish_balance_reflector().await;

    match outcome {
        ExchangeOutcome::Replied(message) => {
            if json {
                let out = json!({ "message": message, "balance": balance.balance });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                let renderer = ChatRenderer::new(&state.config.assistant_name);
                println!("{}", renderer.render(&message));
                if !quiet {
                    println!("  {}", describe_balance(&state.config.credit_label, &balance));
                }
            }
            Ok(())
        }
        ExchangeOutcome::Failed(error) => {
            if json {
                let out = json!({ "error": error.to_string() });
                println!("{}", serde_json::to_string_pretty(&out)?);
            }
            anyhow::bail!("no reply: {error}")
        }
        ExchangeOutcome::Ignored(IgnoreReason::EmptyMessage) => {
            anyhow::bail!("message is empty")
        }
        ExchangeOutcome::Ignored(IgnoreReason::Busy) => {
            if !quiet {
                eprintln!("  {} {}", style("!").yellow().bold(), state.config.typing_indicator());
            }
            anyhow::bail!("another reply is still being generated")
        }
    }
}
