//! PostgreSQL approval policy adapter

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{CompanyId, DomainPort, HealthCheckResult, HealthCheckable, PortError};
use domain_expense::{ApprovalPolicy, PolicyRepository};

use crate::pool::ping;
use crate::repositories::policies::{ApprovalPolicyRepository, PolicyRow};

/// PostgreSQL-backed implementation of `PolicyRepository`
#[derive(Debug, Clone)]
pub struct PostgresPolicyAdapter {
    repository: ApprovalPolicyRepository,
    pool: PgPool,
}

impl PostgresPolicyAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: ApprovalPolicyRepository::new(pool.clone()),
            pool,
        }
    }
}

impl DomainPort for PostgresPolicyAdapter {}

#[async_trait]
impl HealthCheckable for PostgresPolicyAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-policy-adapter").await
    }
}

#[async_trait]
impl PolicyRepository for PostgresPolicyAdapter {
    #[instrument(skip(self), fields(company_id = %company_id))]
    async fn get(&self, company_id: CompanyId) -> Result<Option<ApprovalPolicy>, PortError> {
        debug!("fetching approval policy");

        let row = self.repository.get_by_company(company_id.into()).await?;
        Ok(row.map(PolicyRow::into_policy).transpose()?)
    }

    #[instrument(skip(self, policy), fields(company_id = %policy.company_id()))]
    async fn put(&self, policy: &ApprovalPolicy) -> Result<(), PortError> {
        let row = PolicyRow::from_policy(policy)?;
        self.repository.upsert(&row).await?;
        debug!(rule_type = %row.rule_type, "approval policy stored");
        Ok(())
    }
}
