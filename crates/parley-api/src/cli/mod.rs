//! CLI command definitions and dispatch for the `parley` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod balance;
pub mod chat;
pub mod history;
pub mod send;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Chat with an assistant from your terminal.
#[derive(Parser)]
#[command(name = "parley", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true, env = "PARLEY_OTEL")]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive chat session.
    Chat {
        /// Keep history in memory only; nothing is read from or written to disk.
        #[arg(long)]
        ephemeral: bool,
    },

    /// Send one message and print the reply.
    Send {
        /// Message text.
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Print the persisted conversation.
    History,

    /// Fetch and print the current credit balance.
    Balance,

    /// Generate shell completions.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}
