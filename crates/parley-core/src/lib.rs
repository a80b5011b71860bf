//! Chat session state machine and collaborator traits for Parley.
//!
//! This crate defines the "ports" (storage, completion backend, credit
//! service) that the infrastructure layer implements, and the three pieces
//! that sit on top of them: the session store, the exchange controller, and
//! the balance reflector. It depends only on `parley-types` -- never on
//! `parley-infra` or any network/filesystem crate.

pub mod chat;
pub mod credit;
pub mod event;
pub mod storage;
