//! Routing logic and persistence port definitions for Handoff.
//!
//! This crate defines the "port" (the `RoutingStore` trait) that the
//! infrastructure layer implements, plus the `RoutingRegistry` that enforces
//! the request and connection lifecycle on top of it. It depends only on
//! `handoff-types` -- never on `handoff-infra` or any database crate.

pub mod clock;
pub mod routing;
