//! Storage abstractions for Parley.
//!
//! Defines the key-value trait the session store persists through.
//! Implementations live in parley-infra.

pub mod kv_store;
