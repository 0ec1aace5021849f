//! Core Kernel - Foundational types and utilities for the expense approval system
//!
//! This crate provides the fundamental building blocks used across all crates:
//! - Money types with precise decimal arithmetic
//! - Currency conversion behind a swappable trait
//! - Common identifiers
//! - Port infrastructure for the hexagonal architecture

pub mod money;
pub mod exchange;
pub mod identifiers;
pub mod ports;

pub use money::{Money, Currency, MoneyError};
pub use exchange::{CurrencyConverter, FixedRateConverter};
pub use identifiers::{ClaimId, CompanyId, UserId};
pub use ports::{PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth};
