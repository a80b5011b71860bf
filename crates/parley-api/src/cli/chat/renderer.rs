//! Terminal rendering of chat messages.
//!
//! Assistant replies are markdown and go through `termimad`; user messages
//! are echoed as plain text. Each message carries a sender label and its
//! timestamp label.

use console::style;
use termimad::MadSkin;

use parley_types::message::{Message, Sender};

/// Renders messages as labelled bubbles.
pub struct ChatRenderer {
    skin: MadSkin,
    assistant_name: String,
}

impl ChatRenderer {
    pub fn new(assistant_name: impl Into<String>) -> Self {
        let mut skin = MadSkin::default_dark();
        skin.bold.set_fg(termimad::crossterm::style::Color::Cyan);
        skin.inline_code
            .set_fg(termimad::crossterm::style::Color::Yellow);

        Self {
            skin,
            assistant_name: assistant_name.into(),
        }
    }

    /// Plain label shown above a message, e.g. `You · just now`.
    pub fn label(&self, message: &Message) -> String {
        let who = match message.sender {
            Sender::User => "You",
            Sender::Assistant => self.assistant_name.as_str(),
        };
        format!("{who} \u{00b7} {}", message.timestamp_label)
    }

    /// Render one message, label included, ready to print.
    pub fn render(&self, message: &Message) -> String {
        let label = self.label(message);
        let header = match message.sender {
            Sender::User => style(label).green().bold().to_string(),
            Sender::Assistant => style(label).cyan().bold().to_string(),
        };
        let body = match message.sender {
            Sender::User => indent(&message.text),
            Sender::Assistant => indent(self.skin.term_text(&message.text).to_string().trim_end()),
        };
        format!("  {header}\n{body}\n")
    }

    /// Render a whole transcript in order.
    pub fn render_history(&self, history: &[Message]) -> String {
        history
            .iter()
            .map(|m| self.render(m))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("  {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}
