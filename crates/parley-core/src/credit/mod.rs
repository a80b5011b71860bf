//! Credit balance mirroring for Parley.
//!
//! The balance lives in an external credit service. `BalanceReflector`
//! refreshes a local read-only copy whenever the chat history changes.

pub mod reflector;
pub mod service;
