//! Approval policy repository

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use domain_expense::{ApprovalPolicy, RuleType};

use crate::error::DatabaseError;

/// Database row for the approval_policies table
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PolicyRow {
    pub company_id: Uuid,
    pub rule_type: String,
    pub document: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

impl PolicyRow {
    pub fn from_policy(policy: &ApprovalPolicy) -> Result<Self, DatabaseError> {
        Ok(Self {
            company_id: policy.company_id().into(),
            rule_type: rule_type_name(policy.rule().rule_type()).to_string(),
            document: serde_json::to_value(policy)?,
            updated_at: policy.updated_at(),
        })
    }

    pub fn into_policy(self) -> Result<ApprovalPolicy, DatabaseError> {
        Ok(serde_json::from_value(self.document)?)
    }
}

/// Repository for company approval policies
#[derive(Debug, Clone)]
pub struct ApprovalPolicyRepository {
    pool: PgPool,
}

impl ApprovalPolicyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_by_company(&self, company_id: Uuid) -> Result<Option<PolicyRow>, DatabaseError> {
        let row = sqlx::query_as::<_, PolicyRow>(
            "SELECT company_id, rule_type, document, updated_at FROM approval_policies WHERE company_id = $1",
        )
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Inserts the company's policy or replaces the existing one
    pub async fn upsert(&self, row: &PolicyRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO approval_policies (company_id, rule_type, document, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (company_id) DO UPDATE
            SET rule_type = EXCLUDED.rule_type,
                document = EXCLUDED.document,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(row.company_id)
        .bind(&row.rule_type)
        .bind(&row.document)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn rule_type_name(rule_type: RuleType) -> &'static str {
    match rule_type {
        RuleType::Percentage => "percentage",
        RuleType::Cfo => "cfo",
        RuleType::Hybrid => "hybrid",
    }
}
