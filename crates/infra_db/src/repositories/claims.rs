//! Expense claims repository
//!
//! Claims are stored as JSON documents. The columns used for filtering
//! (company, claimant, status, current approver) and the version are
//! denormalized next to the document and kept in step on every write.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use domain_expense::{ClaimQuery, ExpenseClaim};

use crate::error::DatabaseError;

const CLAIM_COLUMNS: &str = "claim_id, company_id, claimant_id, status, current_level, \
     current_approver_id, version, document, created_at, updated_at";

/// Database row for the expense_claims table
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClaimRow {
    pub claim_id: Uuid,
    pub company_id: Uuid,
    pub claimant_id: Uuid,
    pub status: String,
    pub current_level: i32,
    pub current_approver_id: Option<Uuid>,
    pub version: i64,
    pub document: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ClaimRow {
    /// Builds the row for a domain claim
    pub fn from_claim(claim: &ExpenseClaim) -> Result<Self, DatabaseError> {
        Ok(Self {
            claim_id: claim.id.into(),
            company_id: claim.company_id.into(),
            claimant_id: claim.claimant_id.into(),
            status: claim.status().as_str().to_string(),
            current_level: to_i32(claim.current_level())?,
            current_approver_id: claim.current_approver_id().map(Uuid::from),
            version: to_i64(claim.version())?,
            document: serde_json::to_value(claim)?,
            created_at: claim.created_at,
            updated_at: claim.updated_at,
        })
    }

    /// Decodes the stored document
    pub fn into_claim(self) -> Result<ExpenseClaim, DatabaseError> {
        Ok(serde_json::from_value(self.document)?)
    }
}

/// Repository for the expense_claims table
#[derive(Debug, Clone)]
pub struct ClaimsRepository {
    pool: PgPool,
}

impl ClaimsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, claim_id: Uuid) -> Result<Option<ClaimRow>, DatabaseError> {
        let row = sqlx::query_as::<_, ClaimRow>(&format!(
            "SELECT {CLAIM_COLUMNS} FROM expense_claims WHERE claim_id = $1"
        ))
        .bind(claim_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Finds claims matching every filter set on `query`, newest first
    pub async fn find(&self, query: &ClaimQuery) -> Result<Vec<ClaimRow>, DatabaseError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {CLAIM_COLUMNS} FROM expense_claims WHERE TRUE"));

        if let Some(company_id) = query.company_id {
            builder.push(" AND company_id = ").push_bind(Uuid::from(company_id));
        }
        if let Some(claimant_id) = query.claimant_id {
            builder.push(" AND claimant_id = ").push_bind(Uuid::from(claimant_id));
        }
        if let Some(approver_id) = query.current_approver_id {
            builder
                .push(" AND current_approver_id = ")
                .push_bind(Uuid::from(approver_id));
        }
        if !query.statuses.is_empty() {
            let statuses: Vec<String> = query
                .statuses
                .iter()
                .map(|s| s.as_str().to_string())
                .collect();
            builder.push(" AND status = ANY(").push_bind(statuses).push(")");
        }
        builder.push(" ORDER BY created_at DESC, claim_id DESC");

        let rows = builder
            .build_query_as::<ClaimRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Inserts a new claim row
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::DuplicateEntry` if the claim id is taken
    pub async fn insert(&self, row: &ClaimRow) -> Result<(), DatabaseError> {
        sqlx::query(&format!(
            "INSERT INTO expense_claims ({CLAIM_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"
        ))
        .bind(row.claim_id)
        .bind(row.company_id)
        .bind(row.claimant_id)
        .bind(&row.status)
        .bind(row.current_level)
        .bind(row.current_approver_id)
        .bind(row.version)
        .bind(&row.document)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Overwrites a claim row only if its stored version is `expected_version`
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::VersionConflict` when another writer got there
    /// first and `DatabaseError::NotFound` when the claim does not exist.
    pub async fn update_versioned(
        &self,
        row: &ClaimRow,
        expected_version: i64,
    ) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE expense_claims
            SET status = $2,
                current_level = $3,
                current_approver_id = $4,
                version = $5,
                document = $6,
                updated_at = $7
            WHERE claim_id = $1 AND version = $8
            "#,
        )
        .bind(row.claim_id)
        .bind(&row.status)
        .bind(row.current_level)
        .bind(row.current_approver_id)
        .bind(row.version)
        .bind(&row.document)
        .bind(row.updated_at)
        .bind(expected_version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM expense_claims WHERE claim_id = $1)")
                .bind(row.claim_id)
                .fetch_one(&self.pool)
                .await?;

        if exists {
            Err(DatabaseError::VersionConflict {
                entity: "Claim",
                id: row.claim_id.to_string(),
                expected: expected_version.unsigned_abs(),
            })
        } else {
            Err(DatabaseError::not_found("Claim", row.claim_id))
        }
    }
}

pub(crate) fn to_i64(value: u64) -> Result<i64, DatabaseError> {
    i64::try_from(value).map_err(|_| DatabaseError::SerializationError(format!("{value} exceeds BIGINT")))
}

fn to_i32(value: u32) -> Result<i32, DatabaseError> {
    i32::try_from(value).map_err(|_| DatabaseError::SerializationError(format!("{value} exceeds INTEGER")))
}
