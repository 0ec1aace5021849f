//! PostgreSQL directory adapter

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use core_kernel::{CompanyId, Currency, DomainPort, PortError, UserId};
use domain_expense::{ClaimantProfile, DirectoryPort};

use crate::repositories::directory::{DirectoryRepository, UserRow};

/// Reads users and companies from PostgreSQL
#[derive(Debug, Clone)]
pub struct PostgresDirectoryAdapter {
    repository: DirectoryRepository,
}

impl PostgresDirectoryAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: DirectoryRepository::new(pool),
        }
    }
}

impl DomainPort for PostgresDirectoryAdapter {}

#[async_trait]
impl DirectoryPort for PostgresDirectoryAdapter {
    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn claimant(&self, user_id: UserId) -> Result<Option<ClaimantProfile>, PortError> {
        let row = self.repository.get_user(user_id.into()).await?;
        Ok(row.map(row_to_profile))
    }

    #[instrument(skip(self), fields(company_id = %company_id))]
    async fn company_admin(&self, company_id: CompanyId) -> Result<Option<UserId>, PortError> {
        let admin = self.repository.first_admin(company_id.into()).await?;
        Ok(admin.map(UserId::from))
    }

    #[instrument(skip(self), fields(company_id = %company_id))]
    async fn company_currency(&self, company_id: CompanyId) -> Result<Option<Currency>, PortError> {
        let code = self.repository.company_currency(company_id.into()).await?;
        code.map(|c| {
            c.trim()
                .parse::<Currency>()
                .map_err(|e| PortError::Transformation { message: e.to_string() })
        })
        .transpose()
    }
}

fn row_to_profile(row: UserRow) -> ClaimantProfile {
    ClaimantProfile {
        user_id: row.user_id.into(),
        display_name: row.display_name,
        company_id: row.company_id.into(),
        manager_id: row.manager_id.map(UserId::from),
    }
}
