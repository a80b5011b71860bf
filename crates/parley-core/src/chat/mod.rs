//! Chat session core for Parley.
//!
//! - `store`: persisted history mirror (`SessionStore`)
//! - `session`: in-memory conversation state (`ChatSession`)
//! - `backend`: the completion backend port (`CompletionBackend`)
//! - `exchange`: one send/reply round trip (`ExchangeController`)

pub mod backend;
pub mod exchange;
pub mod session;
pub mod store;
