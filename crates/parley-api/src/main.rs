//! Parley terminal chat client entry point.
//!
//! Binary name: `parley`
//!
//! Parses CLI arguments, sets up tracing, wires the chat session to its
//! storage and HTTP collaborators, then dispatches to a command handler.

mod cli;
mod state;
#[cfg(test)]
mod test_support;

use clap::Parser;
use clap_complete::generate;
use parley_observe::{TracingOptions, init_tracing, shutdown_tracing};

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut tracing_options = TracingOptions::from_verbosity(cli.verbose);
    if cli.quiet && cli.verbose == 0 {
        tracing_options.default_filter = "error".to_string();
    }
    tracing_options.enable_otel = cli.otel;
    init_tracing(&tracing_options).map_err(|e| anyhow::anyhow!("failed to set up tracing: {e}"))?;

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "parley", &mut std::io::stdout());
        return Ok(());
    }

    let ephemeral = matches!(cli.command, Commands::Chat { ephemeral: true });
    let state = AppState::init(ephemeral).await?;

    let result = match cli.command {
        Commands::Chat { ephemeral } => cli::chat::loop_runner::run_chat_loop(&state, ephemeral).await,
        Commands::Send { text } => {
            cli::send::send_message(&state, &text.join(" "), cli.json, cli.quiet).await
        }
        Commands::History => cli::history::show_history(&state, cli.json),
        Commands::Balance => cli::balance::show_balance(&state, cli.json).await,
        Commands::Completions { .. } => unreachable!("handled above"),
    };

    state.shutdown();
    shutdown_tracing();
    result
}
