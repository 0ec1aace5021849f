//! Port adapters that live alongside the domain
//!
//! Database-backed adapters are in `infra_db`.

pub mod memory;

pub use memory::{InMemoryClaimRepository, InMemoryDirectory, InMemoryPolicyRepository};
