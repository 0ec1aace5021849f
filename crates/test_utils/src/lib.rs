//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! expense approval test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built test data for common entities
//! - `builders`: Builders for claims, policies and a seeded in-memory company
//! - `assertions`: Custom assertion helpers for claims and money
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use assertions::*;
pub use generators::*;
