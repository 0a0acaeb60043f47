//! Participant routing: who is talking to whom.
//!
//! - `store` -- `RoutingStore` port the registry persists through
//! - `memory` -- in-process reference implementation of the port
//! - `lookup` -- criteria search over participant pools
//! - `registry` -- `RoutingRegistry` with registration, request, and connection lifecycles

pub mod lookup;
pub mod memory;
pub mod registry;
pub mod store;

pub use lookup::SearchCriteria;
pub use memory::MemoryRoutingStore;
pub use registry::RoutingRegistry;
pub use store::RoutingStore;
