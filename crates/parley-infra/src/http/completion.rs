//! HttpCompletionBackend -- concrete [`CompletionBackend`] over HTTP.
//!
//! POSTs `{"messageList": [...]}` with the full ordered history and expects
//! `{"content": "..."}` back. Timeouts and aborts are enforced by the
//! exchange controller, not here.

use parley_core::chat::backend::CompletionBackend;
use parley_types::completion::{CompletionError, CompletionReply, CompletionRequest};
use parley_types::message::Message;

/// Completion backend reached at a single endpoint URL.
#[derive(Debug, Clone)]
pub struct HttpCompletionBackend {
    client: reqwest::Client,
    url: String,
}

impl HttpCompletionBackend {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), url)
    }

    /// Share an existing client (connection pool) with other services.
    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl CompletionBackend for HttpCompletionBackend {
    async fn complete(&self, history: &[Message]) -> Result<CompletionReply, CompletionError> {
        let body = CompletionRequest {
            message_list: history.to_vec(),
        };

        tracing::debug!(url = %self.url, messages = history.len(), "Requesting completion");

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| CompletionError::Network(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body: error_body,
            });
        }

        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| CompletionError::Malformed(format!("failed to parse response: {e}")))?;

        CompletionReply::from_value(value)
    }
}
