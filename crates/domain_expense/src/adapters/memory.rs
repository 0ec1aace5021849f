//! In-memory adapters
//!
//! Process-local implementations of the expense ports, used by tests and by
//! the API server when no database is configured. Claim writes apply the
//! same version check as the database adapter.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use core_kernel::{
    ClaimId, CompanyId, Currency, DomainPort, HealthCheckResult, HealthCheckable, PortError, UserId,
};

use crate::claim::ExpenseClaim;
use crate::policy::ApprovalPolicy;
use crate::ports::{ClaimQuery, ClaimRepository, ClaimantProfile, DirectoryPort, PolicyRepository};

/// Claim repository backed by a map
#[derive(Debug, Default)]
pub struct InMemoryClaimRepository {
    claims: RwLock<HashMap<ClaimId, ExpenseClaim>>,
}

impl InMemoryClaimRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored claims
    pub async fn len(&self) -> usize {
        self.claims.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.claims.read().await.is_empty()
    }
}

impl DomainPort for InMemoryClaimRepository {}

#[async_trait]
impl HealthCheckable for InMemoryClaimRepository {
    async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult::healthy("memory-claims", 0)
    }
}

#[async_trait]
impl ClaimRepository for InMemoryClaimRepository {
    async fn get(&self, id: ClaimId) -> Result<Option<ExpenseClaim>, PortError> {
        Ok(self.claims.read().await.get(&id).cloned())
    }

    async fn find(&self, query: &ClaimQuery) -> Result<Vec<ExpenseClaim>, PortError> {
        let claims = self.claims.read().await;
        let mut found: Vec<ExpenseClaim> = claims
            .values()
            .filter(|c| query.matches(c))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(found)
    }

    async fn insert(&self, claim: &ExpenseClaim) -> Result<(), PortError> {
        let mut claims = self.claims.write().await;
        if claims.contains_key(&claim.id) {
            return Err(PortError::conflict(format!("claim {} already exists", claim.id)));
        }
        claims.insert(claim.id, claim.clone());
        Ok(())
    }

    async fn replace(&self, claim: &ExpenseClaim, expected_version: u64) -> Result<(), PortError> {
        let mut claims = self.claims.write().await;
        let stored = claims
            .get_mut(&claim.id)
            .ok_or_else(|| PortError::not_found("Claim", claim.id))?;

        if stored.version() != expected_version {
            return Err(PortError::conflict(format!(
                "claim {} is at version {}, expected {}",
                claim.id,
                stored.version(),
                expected_version
            )));
        }
        *stored = claim.clone();
        Ok(())
    }
}

/// Policy repository backed by a map
#[derive(Debug, Default)]
pub struct InMemoryPolicyRepository {
    policies: RwLock<HashMap<CompanyId, ApprovalPolicy>>,
}

impl InMemoryPolicyRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DomainPort for InMemoryPolicyRepository {}

#[async_trait]
impl HealthCheckable for InMemoryPolicyRepository {
    async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult::healthy("memory-policies", 0)
    }
}

#[async_trait]
impl PolicyRepository for InMemoryPolicyRepository {
    async fn get(&self, company_id: CompanyId) -> Result<Option<ApprovalPolicy>, PortError> {
        Ok(self.policies.read().await.get(&company_id).cloned())
    }

    async fn put(&self, policy: &ApprovalPolicy) -> Result<(), PortError> {
        self.policies
            .write()
            .await
            .insert(policy.company_id(), policy.clone());
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct DirectoryUser {
    profile: ClaimantProfile,
    is_admin: bool,
}

/// Directory seeded by the caller
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    users: RwLock<Vec<DirectoryUser>>,
    currencies: RwLock<HashMap<CompanyId, Currency>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a company and the currency it reviews claims in
    pub async fn add_company(&self, company_id: CompanyId, currency: Currency) {
        self.currencies.write().await.insert(company_id, currency);
    }

    /// Registers a user; admins are used as fallback first approvers
    pub async fn add_user(&self, profile: ClaimantProfile, is_admin: bool) {
        let mut users = self.users.write().await;
        users.retain(|u| u.profile.user_id != profile.user_id);
        users.push(DirectoryUser { profile, is_admin });
    }
}

impl DomainPort for InMemoryDirectory {}

#[async_trait]
impl DirectoryPort for InMemoryDirectory {
    async fn claimant(&self, user_id: UserId) -> Result<Option<ClaimantProfile>, PortError> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.profile.user_id == user_id)
            .map(|u| u.profile.clone()))
    }

    async fn company_admin(&self, company_id: CompanyId) -> Result<Option<UserId>, PortError> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.is_admin && u.profile.company_id == company_id)
            .map(|u| u.profile.user_id))
    }

    async fn company_currency(&self, company_id: CompanyId) -> Result<Option<Currency>, PortError> {
        Ok(self.currencies.read().await.get(&company_id).copied())
    }
}
