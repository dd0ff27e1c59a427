//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Commands (webhook receipt, ledgering, checkout) are kept apart from
//! queries (entitlement, job polling).

pub mod handlers;

pub use handlers::*;
