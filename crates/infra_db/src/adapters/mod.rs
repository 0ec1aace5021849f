//! Domain Adapters
//!
//! PostgreSQL implementations of the expense domain ports. Each adapter
//! delegates SQL to its repository, converts rows into domain types, and
//! translates `DatabaseError` into `PortError`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use infra_db::adapters::{PostgresClaimAdapter, PostgresDirectoryAdapter, PostgresPolicyAdapter};
//!
//! let workflow = ClaimWorkflow::new(
//!     Arc::new(PostgresClaimAdapter::new(pool.clone())),
//!     Arc::new(PostgresPolicyAdapter::new(pool.clone())),
//!     Arc::new(PostgresDirectoryAdapter::new(pool)),
//! );
//! ```

pub mod claims;
pub mod policies;
pub mod directory;

pub use claims::PostgresClaimAdapter;
pub use policies::PostgresPolicyAdapter;
pub use directory::PostgresDirectoryAdapter;
