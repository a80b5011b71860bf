//! `parley history`: print the persisted conversation.

use console::style;

use crate::cli::chat::renderer::ChatRenderer;
use crate::state::AppState;

pub fn show_history(state: &AppState, json: bool) -> anyhow::Result<()> {
    let history = state.session.history();

    if json {
        println!("{}", serde_json::to_string_pretty(&history)?);
        return Ok(());
    }

    if history.is_empty() {
        println!("  {}", style("No messages yet.").dim());
        return Ok(());
    }

    let renderer = ChatRenderer::new(&state.config.assistant_name);
    println!();
    println!("{}", renderer.render_history(&history));
    Ok(())
}
