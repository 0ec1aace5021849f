//! Repository implementations
//!
//! Repositories own the SQL. They work in row types and `DatabaseError`;
//! the adapters in `crate::adapters` map them onto the domain ports.
//!
//! All queries are built at runtime, so the crate compiles without a live
//! database.

pub mod claims;
pub mod policies;
pub mod directory;

pub use claims::{ClaimRow, ClaimsRepository};
pub use policies::{ApprovalPolicyRepository, PolicyRow};
pub use directory::{DirectoryRepository, UserRow};
