//! Main chat loop orchestration.
//!
//! Reads input while an exchange runs in a background task, so Ctrl+C can
//! abort a pending reply and new messages can be turned away while the
//! assistant is still thinking. The prompt carries the live credit balance.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::task::{JoinError, JoinHandle};
use tracing::{info, warn};

use parley_core::chat::exchange::{ExchangeOutcome, IgnoreReason};
use parley_infra::filesystem::storage_dir;
use parley_types::completion::CompletionError;
use parley_types::credit::BalanceSnapshot;

use crate::state::AppState;

use super::banner::print_welcome_banner;
use super::commands::{self, ChatCommand};
use super::input::{ChatInput, InputEvent};
use super::renderer::ChatRenderer;

/// Run the interactive chat loop until `/exit` or Ctrl+D.
pub async fn run_chat_loop(state: &AppState, ephemeral: bool) -> anyhow::Result<()> {
    let config = &state.config;
    let renderer = ChatRenderer::new(&config.assistant_name);

    let storage_path = storage_dir(&state.data_dir).display().to_string();
    print_welcome_banner(
        &config.assistant_name,
        &config.assistant_info,
        (!ephemeral).then_some(storage_path.as_str()),
    );

    let history = state.session.history();
    if !history.is_empty() {
        println!("{}", renderer.render_history(&history));
    }

    state.start_balance_reflector();
    let mut balance_rx = state.reflector.subscribe();
    let mut balance_open = true;
    // Set by `/balance`; the result is printed once the refresh lands.
    let mut balance_requested = false;

    let initial_prompt = prompt_for(&config.credit_label, &balance_rx.borrow());
    let (mut input, mut out) = ChatInput::new(initial_prompt)
        .map_err(|e| anyhow::anyhow!("Failed to initialize input: {e}"))?;

    let mut pending: Option<JoinHandle<ExchangeOutcome>> = None;
    let mut spinner: Option<ProgressBar> = None;

    loop {
        tokio::select! {
            joined = wait_for(&mut pending), if pending.is_some() => {
                pending = None;
                if let Some(spinner) = spinner.take() {
                    spinner.finish_and_clear();
                }
                match joined {
                    Ok(outcome) => {
                        if let Some(text) = describe_outcome(&renderer, &outcome) {
                            writeln!(out, "{text}")?;
                        }
                    }
                    Err(e) => warn!(error = %e, "Exchange task ended abnormally"),
                }
            }

            changed = balance_rx.changed(), if balance_open => {
                if changed.is_err() {
                    balance_open = false;
                } else {
                    let snapshot = balance_rx.borrow_and_update().clone();
                    input.update_prompt(&prompt_for(&config.credit_label, &snapshot));
                    if let Some(report) =
                        pending_balance_report(&mut balance_requested, &config.credit_label, &snapshot)
                    {
                        writeln!(out, "  {report}")?;
                    }
                }
            }

            event = input.read_line() => match event {
                InputEvent::Eof => break,
                InputEvent::Interrupted => {
                    if pending.is_some() {
                        state.exchange.abort();
                    } else {
                        writeln!(out, "  {}", style("Press Ctrl+D to exit, or keep chatting.").dim())?;
                    }
                }
                InputEvent::Message(text) => {
                    if text.is_empty() {
                        continue;
                    }
                    input.remember(&text);

                    if let Some(cmd) = commands::parse(&text) {
                        match cmd {
                            ChatCommand::Help => write!(out, "{}", commands::help_text())?,
                            ChatCommand::History => {
                                let history = state.session.history();
                                if history.is_empty() {
                                    writeln!(out, "  {}", style("No messages yet.").dim())?;
                                } else {
                                    writeln!(out, "{}", renderer.render_history(&history))?;
                                }
                            }
                            ChatCommand::Balance => {
                                balance_requested = true;
                                state.reflector.request_refresh();
                            }
                            ChatCommand::Clear => input.clear(),
                            ChatCommand::Exit => break,
                            ChatCommand::Unknown(name) => {
                                writeln!(
                                    out,
                                    "  {} Unknown command: {}. Type /help for available commands.",
                                    style("?").yellow().bold(),
                                    style(name).dim()
                                )?;
                            }
                        }
                        continue;
                    }

                    if pending.is_some() || state.session.is_generating() {
                        writeln!(
                            out,
                            "  {} {}. Wait for the reply or press Ctrl+C to stop it.",
                            style("!").yellow().bold(),
                            config.typing_indicator()
                        )?;
                        continue;
                    }

                    let exchange = Arc::clone(&state.exchange);
                    pending = Some(tokio::spawn(async move { exchange.send(&text).await }));
                    spinner = Some(thinking_spinner(&config.typing_indicator()));
                }
            },
        }
    }

    if let Some(handle) = pending.take() {
        info!("Leaving chat with a reply still pending, aborting it");
        state.exchange.abort();
        let _ = handle.await;
    }
    if let Some(spinner) = spinner.take() {
        spinner.finish_and_clear();
    }

    writeln!(out, "  {}", style("Session ended.").dim())?;
    input.flush();
    state.shutdown();
    Ok(())
}

async fn wait_for(
    pending: &mut Option<JoinHandle<ExchangeOutcome>>,
) -> Result<ExchangeOutcome, JoinError> {
    match pending {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}

fn thinking_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("  {spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Prompt with the balance indicator, e.g. `[Chipps: 42] You > `.
pub fn prompt_for(label: &str, snapshot: &BalanceSnapshot) -> String {
    format!(
        "  {} {} ",
        style(format!("[{}]", snapshot.display(label))).dim(),
        style("You >").green().bold()
    )
}

/// One-line balance report, including why the value is unknown.
pub fn describe_balance(label: &str, snapshot: &BalanceSnapshot) -> String {
    match &snapshot.last_error {
        Some(error) if snapshot.balance.is_none() => format!(
            "{} {}",
            snapshot.display(label),
            style(format!("({error})")).dim()
        ),
        _ => snapshot.display(label),
    }
}

/// Report for an outstanding `/balance` request, once its refresh has landed.
pub fn pending_balance_report(
    requested: &mut bool,
    label: &str,
    snapshot: &BalanceSnapshot,
) -> Option<String> {
    if !*requested || snapshot.is_loading {
        return None;
    }
    *requested = false;
    Some(describe_balance(label, snapshot))
}

/// What to print when an exchange ends, if anything.
pub fn describe_outcome(renderer: &ChatRenderer, outcome: &ExchangeOutcome) -> Option<String> {
    match outcome {
        ExchangeOutcome::Replied(message) => Some(renderer.render(message)),
        ExchangeOutcome::Failed(CompletionError::Aborted) => Some(format!(
            "  {}",
            style("Reply stopped. Your message is kept in the history.").dim()
        )),
        ExchangeOutcome::Failed(error) => Some(format!(
            "  {} Could not get a reply: {error}\n  {}",
            style("!").red().bold(),
            style("Your message is kept in the history. Send again to retry.").dim()
        )),
        ExchangeOutcome::Ignored(IgnoreReason::Busy) => Some(format!(
            "  {} Still waiting on the previous reply.",
            style("!").yellow().bold()
        )),
        ExchangeOutcome::Ignored(IgnoreReason::EmptyMessage) => None,
    }
}
