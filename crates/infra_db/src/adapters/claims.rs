//! PostgreSQL claim adapter

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{ClaimId, DomainPort, HealthCheckResult, HealthCheckable, PortError};
use domain_expense::{ClaimQuery, ClaimRepository, ExpenseClaim};

use crate::pool::ping;
use crate::repositories::claims::{to_i64, ClaimRow, ClaimsRepository};

/// PostgreSQL-backed implementation of `ClaimRepository`
///
/// `replace` is a single conditional `UPDATE ... WHERE version = $expected`,
/// so the version check and the write are atomic.
#[derive(Debug, Clone)]
pub struct PostgresClaimAdapter {
    repository: ClaimsRepository,
    pool: PgPool,
}

impl PostgresClaimAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: ClaimsRepository::new(pool.clone()),
            pool,
        }
    }

    /// Returns the underlying repository
    pub fn repository(&self) -> &ClaimsRepository {
        &self.repository
    }
}

impl DomainPort for PostgresClaimAdapter {}

#[async_trait]
impl HealthCheckable for PostgresClaimAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-claim-adapter").await
    }
}

#[async_trait]
impl ClaimRepository for PostgresClaimAdapter {
    #[instrument(skip(self), fields(claim_id = %id))]
    async fn get(&self, id: ClaimId) -> Result<Option<ExpenseClaim>, PortError> {
        debug!("fetching claim");

        let row = self.repository.get_by_id(id.into()).await?;
        Ok(row.map(ClaimRow::into_claim).transpose()?)
    }

    #[instrument(skip(self))]
    async fn find(&self, query: &ClaimQuery) -> Result<Vec<ExpenseClaim>, PortError> {
        let rows = self.repository.find(query).await?;
        debug!(count = rows.len(), "claims found");

        rows.into_iter()
            .map(|row| row.into_claim().map_err(PortError::from))
            .collect()
    }

    #[instrument(skip(self, claim), fields(claim_id = %claim.id))]
    async fn insert(&self, claim: &ExpenseClaim) -> Result<(), PortError> {
        let row = ClaimRow::from_claim(claim)?;
        self.repository.insert(&row).await?;
        debug!("claim inserted");
        Ok(())
    }

    #[instrument(skip(self, claim), fields(claim_id = %claim.id, version = claim.version()))]
    async fn replace(&self, claim: &ExpenseClaim, expected_version: u64) -> Result<(), PortError> {
        let row = ClaimRow::from_claim(claim)?;
        self.repository
            .update_versioned(&row, to_i64(expected_version)?)
            .await?;
        debug!("claim updated");
        Ok(())
    }
}
