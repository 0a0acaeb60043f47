//! Infrastructure layer for Handoff.
//!
//! Contains the SQLite implementation of the `RoutingStore` port defined in
//! `handoff-core`, plus data directory resolution and config loading.

pub mod config;
pub mod sqlite;
