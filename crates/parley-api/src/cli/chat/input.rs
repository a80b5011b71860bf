//! Async readline input handling for the chat loop.
//!
//! Wraps `rustyline_async::Readline` so the loop can wait for a line while an
//! exchange is still in flight.

use rustyline_async::{Readline, ReadlineError, ReadlineEvent, SharedWriter};

/// Events produced by the input handler.
#[derive(Debug, PartialEq, Eq)]
pub enum InputEvent {
    /// User submitted a line (already trimmed).
    Message(String),
    /// End of file (Ctrl+D).
    Eof,
    /// Interrupt signal (Ctrl+C).
    Interrupted,
}

/// Async input handler wrapping rustyline_async.
pub struct ChatInput {
    rl: Readline,
}

impl ChatInput {
    /// Create the handler and a writer that prints above the prompt.
    pub fn new(prompt: String) -> Result<(Self, SharedWriter), ReadlineError> {
        let (rl, stdout) = Readline::new(prompt)?;
        Ok((Self { rl }, stdout))
    }

    pub fn update_prompt(&mut self, prompt: &str) {
        let _ = self.rl.update_prompt(prompt);
    }

    /// Wait for the next line, Ctrl+C, or Ctrl+D.
    pub async fn read_line(&mut self) -> InputEvent {
        match self.rl.readline().await {
            Ok(event) => classify(event),
            Err(_) => InputEvent::Eof,
        }
    }

    /// Record a submitted line so arrow-up recalls it.
    pub fn remember(&mut self, line: &str) {
        self.rl.add_history_entry(line.to_string());
    }

    pub fn clear(&mut self) {
        let _ = self.rl.clear();
    }

    /// Restore the terminal before exiting.
    pub fn flush(&mut self) {
        let _ = self.rl.flush();
    }
}

fn classify(event: ReadlineEvent) -> InputEvent {
    match event {
        ReadlineEvent::Line(line) => InputEvent::Message(line.trim().to_string()),
        ReadlineEvent::Eof => InputEvent::Eof,
        ReadlineEvent::Interrupted => InputEvent::Interrupted,
    }
}
