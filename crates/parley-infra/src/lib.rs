//! Infrastructure layer for Parley.
//!
//! Contains implementations of the ports defined in `parley-core`:
//! file-backed and in-memory key-value storage, the HTTP completion backend,
//! the HTTP credit service, plus config loading and data-directory layout.

pub mod config;
pub mod filesystem;
pub mod http;
pub mod storage;
