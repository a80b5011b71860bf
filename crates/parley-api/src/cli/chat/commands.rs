//! Slash command parsing for the chat loop.
//!
//! Commands start with `/` and never reach the completion backend.

use console::style;

/// Available slash commands in the chat loop.
#[derive(Debug, PartialEq, Eq)]
pub enum ChatCommand {
    /// Show available commands.
    Help,
    /// Reprint the conversation so far.
    History,
    /// Refresh and show the credit balance.
    Balance,
    /// Clear the terminal screen (history is kept).
    Clear,
    /// Exit the chat session.
    Exit,
    /// Unknown command.
    Unknown(String),
}

/// Parse user input as a slash command.
///
/// Returns `None` if the input doesn't start with `/`.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let cmd = trimmed
        .split_whitespace()
        .next()
        .unwrap_or(trimmed)
        .to_lowercase();

    match cmd.as_str() {
        "/help" | "/h" | "/?" => Some(ChatCommand::Help),
        "/history" | "/log" => Some(ChatCommand::History),
        "/balance" | "/credits" => Some(ChatCommand::Balance),
        "/clear" | "/cls" => Some(ChatCommand::Clear),
        "/exit" | "/quit" | "/q" => Some(ChatCommand::Exit),
        other => Some(ChatCommand::Unknown(other.to_string())),
    }
}

/// Help text listing all available commands.
pub fn help_text() -> String {
    let rows = [
        ("/help", "Show this help message"),
        ("/history", "Show the conversation so far"),
        ("/balance", "Refresh and show your credit balance"),
        ("/clear", "Clear the screen (history is kept)"),
        ("/exit", "End the chat session"),
    ];

    let mut out = format!("\n  {}\n\n", style("Available commands:").bold());
    for (name, about) in rows {
        out.push_str(&format!("  {:<10} {about}\n", style(name).cyan()));
    }
    out.push_str(&format!(
        "\n  {}\n",
        style("Ctrl+C stops a pending reply, Ctrl+D exits").dim()
    ));
    out
}
