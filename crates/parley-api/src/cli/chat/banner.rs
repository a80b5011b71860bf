//! Header banner printed when a chat session starts.

use console::style;

/// Print the conversation header: assistant name, info line, and storage mode.
pub fn print_welcome_banner(assistant_name: &str, assistant_info: &str, persisted_to: Option<&str>) {
    println!();
    println!("  {} {}", style("*").cyan(), style(assistant_name).cyan().bold());
    println!("  {}", style(assistant_info).dim());
    println!();
    match persisted_to {
        Some(path) => println!("  {}  {}", style("History:").bold(), style(path).dim()),
        None => println!("  {}  {}", style("History:").bold(), style("in memory only").dim()),
    }
    println!();
    println!(
        "  {}",
        style("Type /help for commands, Ctrl+C to stop a reply, Ctrl+D to exit").dim()
    );
    println!("  {}", style("---").dim());
    println!();
}
