//! Shared domain types for Parley.
//!
//! This crate contains the types that flow between the chat core, its
//! adapters, and the terminal front end: messages, wire envelopes for the
//! completion backend and credit service, balance snapshots, session events,
//! configuration, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod completion;
pub mod config;
pub mod credit;
pub mod error;
pub mod event;
pub mod message;
