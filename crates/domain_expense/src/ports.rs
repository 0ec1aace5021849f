//! Expense Domain Ports
//!
//! The engine reaches its collaborators only through these traits:
//!
//! - **ClaimRepository**: stores claims; writes are compare-and-swap on the
//!   claim's version so concurrent transitions cannot lose updates
//! - **PolicyRepository**: one approval policy per company
//! - **DirectoryPort**: read-only view of users and companies
//!
//! Adapters: in-memory (`crate::adapters::memory`) and PostgreSQL (`infra_db`).
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use domain_expense::adapters::memory::{InMemoryClaimRepository, InMemoryPolicyRepository, InMemoryDirectory};
//!
//! let workflow = ClaimWorkflow::new(
//!     Arc::new(InMemoryClaimRepository::new()),
//!     Arc::new(InMemoryPolicyRepository::new()),
//!     Arc::new(InMemoryDirectory::new()),
//! );
//! ```

use async_trait::async_trait;

use core_kernel::{ClaimId, CompanyId, Currency, DomainPort, HealthCheckable, PortError, UserId};

use crate::claim::{ClaimStatus, ExpenseClaim};
use crate::policy::ApprovalPolicy;

/// Query parameters for finding claims
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimQuery {
    pub company_id: Option<CompanyId>,
    pub claimant_id: Option<UserId>,
    pub current_approver_id: Option<UserId>,
    /// Empty means any status
    pub statuses: Vec<ClaimStatus>,
}

impl ClaimQuery {
    /// Claims submitted by a user
    pub fn by_claimant(claimant_id: UserId) -> Self {
        Self {
            claimant_id: Some(claimant_id),
            ..Default::default()
        }
    }

    /// All claims of a company
    pub fn by_company(company_id: CompanyId) -> Self {
        Self {
            company_id: Some(company_id),
            ..Default::default()
        }
    }

    /// Open claims waiting on a given approver
    pub fn awaiting(approver_id: UserId) -> Self {
        Self {
            current_approver_id: Some(approver_id),
            ..Default::default()
        }
        .open_only()
    }

    /// Restricts the query to `Pending` and `InReview` claims
    pub fn open_only(mut self) -> Self {
        self.statuses = vec![ClaimStatus::Pending, ClaimStatus::InReview];
        self
    }

    /// Returns true if the claim satisfies every filter that is set
    pub fn matches(&self, claim: &ExpenseClaim) -> bool {
        self.company_id.map_or(true, |c| claim.company_id == c)
            && self.claimant_id.map_or(true, |u| claim.claimant_id == u)
            && self
                .current_approver_id
                .map_or(true, |u| claim.current_approver_id() == Some(u))
            && (self.statuses.is_empty() || self.statuses.contains(&claim.status()))
    }
}

/// What the directory knows about a claimant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimantProfile {
    pub user_id: UserId,
    pub display_name: String,
    pub company_id: CompanyId,
    pub manager_id: Option<UserId>,
}

/// Storage for expense claims
#[async_trait]
pub trait ClaimRepository: DomainPort + HealthCheckable {
    /// Retrieves a claim, or `None` if it does not exist
    async fn get(&self, id: ClaimId) -> Result<Option<ExpenseClaim>, PortError>;

    /// Finds claims matching the query, newest first
    async fn find(&self, query: &ClaimQuery) -> Result<Vec<ExpenseClaim>, PortError>;

    /// Stores a new claim
    ///
    /// Returns `PortError::Conflict` if the identifier is already taken.
    async fn insert(&self, claim: &ExpenseClaim) -> Result<(), PortError>;

    /// Replaces a stored claim if its version still equals `expected_version`
    ///
    /// Returns `PortError::Conflict` when the stored version differs and
    /// `PortError::NotFound` when the claim does not exist.
    async fn replace(&self, claim: &ExpenseClaim, expected_version: u64) -> Result<(), PortError>;
}

/// Storage for company approval policies
#[async_trait]
pub trait PolicyRepository: DomainPort + HealthCheckable {
    /// Retrieves the company's policy, or `None` if none is configured
    async fn get(&self, company_id: CompanyId) -> Result<Option<ApprovalPolicy>, PortError>;

    /// Creates or replaces the company's policy
    async fn put(&self, policy: &ApprovalPolicy) -> Result<(), PortError>;
}

/// Read-only access to the user and company directory
#[async_trait]
pub trait DirectoryPort: DomainPort {
    /// Looks up a claimant
    async fn claimant(&self, user_id: UserId) -> Result<Option<ClaimantProfile>, PortError>;

    /// Any administrator of the company, used when a claimant has no manager
    async fn company_admin(&self, company_id: CompanyId) -> Result<Option<UserId>, PortError>;

    /// The currency the company reviews claims in
    async fn company_currency(&self, company_id: CompanyId) -> Result<Option<Currency>, PortError>;
}
