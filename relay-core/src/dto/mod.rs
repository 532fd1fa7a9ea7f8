//! Data Transfer Objects for the orchestrator HTTP API
//!
//! Request and response bodies exchanged between the orchestrator and its
//! callers (the CLI, the client crate, and third-party integrations).

pub mod job;
pub mod system;
pub mod user;
