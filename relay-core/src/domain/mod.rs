//! Core domain types
//!
//! These types represent the business entities of the automation service and
//! are shared between the orchestrator (which persists them) and its clients.

pub mod affinity;
pub mod callback;
pub mod credential;
pub mod error;
pub mod job;
