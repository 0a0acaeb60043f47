//! Shared domain types for Handoff.
//!
//! This crate contains the value types the routing registry works with:
//! participants, connection requests, connections, operation results, and
//! their associated error and configuration types.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod config;
pub mod connection;
pub mod error;
pub mod participant;
pub mod result;
