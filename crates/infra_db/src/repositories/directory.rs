//! User and company directory repository

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DatabaseError;

/// A user as needed by the claim workflow
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub display_name: String,
    pub manager_id: Option<Uuid>,
}

/// Read-only access to the users and companies tables
#[derive(Debug, Clone)]
pub struct DirectoryRepository {
    pool: PgPool,
}

impl DirectoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<Option<UserRow>, DatabaseError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT user_id, company_id, display_name, manager_id FROM users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// The longest-standing admin of the company
    pub async fn first_admin(&self, company_id: Uuid) -> Result<Option<Uuid>, DatabaseError> {
        let admin = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT user_id FROM users
            WHERE company_id = $1 AND role = 'Admin'
            ORDER BY created_at, user_id
            LIMIT 1
            "#,
        )
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(admin)
    }

    /// ISO 4217 code of the company's currency
    pub async fn company_currency(&self, company_id: Uuid) -> Result<Option<String>, DatabaseError> {
        let code = sqlx::query_scalar::<_, String>(
            "SELECT currency FROM companies WHERE company_id = $1",
        )
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(code)
    }
}
