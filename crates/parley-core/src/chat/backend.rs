//! CompletionBackend trait definition.
//!
//! The backend is stateless: it receives the entire ordered history on every
//! call and answers with one reply. Uses RPITIT (native async fn in traits).
//! Implementations live in parley-infra (e.g., `HttpCompletionBackend`).

use std::sync::Arc;

use parley_types::completion::{CompletionError, CompletionReply};
use parley_types::message::Message;

/// Trait for the service that turns a conversation into the next reply.
pub trait CompletionBackend: Send + Sync {
    /// Send the full history and wait for the assistant's reply.
    fn complete(
        &self,
        history: &[Message],
    ) -> impl std::future::Future<Output = Result<CompletionReply, CompletionError>> + Send;
}

impl<T: CompletionBackend> CompletionBackend for Arc<T> {
    fn complete(
        &self,
        history: &[Message],
    ) -> impl std::future::Future<Output = Result<CompletionReply, CompletionError>> + Send {
        (**self).complete(history)
    }
}
