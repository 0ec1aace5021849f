//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the expense approval system, built on SQLx.
//!
//! # Architecture
//!
//! - `repositories`: SQL and row types for claims, policies and the directory
//! - `adapters`: implementations of the `domain_expense` ports on top of
//!   the repositories
//!
//! Claims and policies are stored as JSONB documents with their filterable
//! fields denormalized into columns. Claim updates are conditional on the
//! stored version, which gives the workflow its compare-and-swap write.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig};
//! use infra_db::adapters::PostgresClaimAdapter;
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/expenses")).await?;
//! run_migrations(&pool).await?;
//! let claims = PostgresClaimAdapter::new(pool.clone());
//! ```

pub mod pool;
pub mod error;
pub mod repositories;
pub mod adapters;

pub use pool::{create_pool, run_migrations, DatabaseConfig, DatabasePool};
pub use error::DatabaseError;
pub use adapters::{PostgresClaimAdapter, PostgresDirectoryAdapter, PostgresPolicyAdapter};
