//! `parley balance`: fetch the credit balance once.

use serde_json::json;

use crate::cli::chat::loop_runner::describe_balance;
use crate::state::AppState;

pub async fn show_balance(state: &AppState, json: bool) -> anyhow::Result<()> {
    let snapshot = state.reflector.refresh().await;

    if json {
        let out = json!({
            "label": state.config.credit_label,
            "balance": snapshot.balance,
            "error": snapshot.last_error,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("  {}", describe_balance(&state.config.credit_label, &snapshot));
    }

    if let Some(error) = snapshot.last_error {
        anyhow::bail!("could not fetch balance: {error}");
    }
    Ok(())
}
