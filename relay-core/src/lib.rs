//! Relay Core
//!
//! Core types shared by the Relay automation service, its HTTP client and CLI.
//!
//! This crate contains:
//! - Domain types: Jobs, workspace affinity, user credentials, callbacks
//! - DTOs: Request/response bodies of the orchestrator HTTP API

pub mod domain;
pub mod dto;
