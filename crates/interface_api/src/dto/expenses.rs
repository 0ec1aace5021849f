//! Expense claim DTOs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use core_kernel::{ClaimId, CompanyId, Currency, UserId};
use domain_expense::{
    AuditAction, AuditEntry, ClaimStatus, ClaimSummary, ExpenseCategory, ExpenseClaim,
    MAX_CLAIM_AMOUNT,
};

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitExpenseRequest {
    #[validate(custom(function = "claimable_amount"))]
    pub amount: Decimal,
    /// ISO 4217 code, case-insensitive
    #[validate(length(equal = 3))]
    pub currency: String,
    pub category: ExpenseCategory,
    #[validate(length(min = 1, max = 500))]
    pub description: String,
    #[validate(length(max = 200))]
    pub merchant: Option<String>,
    pub expense_date: NaiveDate,
    pub receipt_ref: Option<String>,
}

fn claimable_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if !amount.is_sign_positive() || amount.is_zero() {
        Err(ValidationError::new("must_be_positive"))
    } else if *amount > MAX_CLAIM_AMOUNT {
        Err(ValidationError::new("exceeds_maximum"))
    } else {
        Ok(())
    }
}

/// Body of approve and reject requests
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ApprovalActionRequest {
    #[validate(length(max = 1000))]
    pub comment: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HistoryEntryResponse {
    pub approver_id: UserId,
    pub approver_name: String,
    pub action: AuditAction,
    pub comment: String,
    pub timestamp: DateTime<Utc>,
    pub system: bool,
}

impl From<&AuditEntry> for HistoryEntryResponse {
    fn from(entry: &AuditEntry) -> Self {
        Self {
            approver_id: entry.approver_id,
            approver_name: entry.approver_name.clone(),
            action: entry.action,
            comment: entry.comment.clone(),
            timestamp: entry.recorded_at,
            system: entry.system,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ExpenseResponse {
    pub id: ClaimId,
    pub claimant_id: UserId,
    pub company_id: CompanyId,
    pub amount: Decimal,
    pub currency: Currency,
    pub converted_amount: Decimal,
    pub company_currency: Currency,
    pub category: ExpenseCategory,
    pub description: String,
    pub merchant: Option<String>,
    pub expense_date: NaiveDate,
    pub receipt_ref: Option<String>,
    pub status: ClaimStatus,
    pub current_level: u32,
    pub current_approver_id: Option<UserId>,
    pub version: u64,
    pub approval_history: Vec<HistoryEntryResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&ExpenseClaim> for ExpenseResponse {
    fn from(claim: &ExpenseClaim) -> Self {
        Self {
            id: claim.id,
            claimant_id: claim.claimant_id,
            company_id: claim.company_id,
            amount: claim.amount.amount(),
            currency: claim.amount.currency(),
            converted_amount: claim.converted_amount.amount(),
            company_currency: claim.converted_amount.currency(),
            category: claim.category,
            description: claim.description.clone(),
            merchant: claim.merchant.clone(),
            expense_date: claim.expense_date,
            receipt_ref: claim.receipt_ref.clone(),
            status: claim.status(),
            current_level: claim.current_level(),
            current_approver_id: claim.current_approver_id(),
            version: claim.version(),
            approval_history: claim.history().iter().map(HistoryEntryResponse::from).collect(),
            created_at: claim.created_at,
            updated_at: claim.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub total: usize,
    pub pending: usize,
    pub in_review: usize,
    pub approved: usize,
    pub rejected: usize,
    pub currency: Currency,
    pub approved_amount: Decimal,
    pub open_amount: Decimal,
}

impl From<ClaimSummary> for SummaryResponse {
    fn from(summary: ClaimSummary) -> Self {
        Self {
            total: summary.total,
            pending: summary.pending,
            in_review: summary.in_review,
            approved: summary.approved,
            rejected: summary.rejected,
            currency: summary.approved_amount.currency(),
            approved_amount: summary.approved_amount.amount(),
            open_amount: summary.open_amount.amount(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request(amount: Decimal, description: &str) -> SubmitExpenseRequest {
        SubmitExpenseRequest {
            amount,
            currency: "usd".to_string(),
            category: ExpenseCategory::Food,
            description: description.to_string(),
            merchant: None,
            expense_date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            receipt_ref: None,
        }
    }

    #[test]
    fn test_submit_request_validation() {
        assert!(request(dec!(12.50), "Lunch").validate().is_ok());
        assert!(request(dec!(0), "Lunch").validate().is_err());
        assert!(request(dec!(-3), "Lunch").validate().is_err());
        assert!(request(dec!(5), "").validate().is_err());
        assert!(request(MAX_CLAIM_AMOUNT, "Lunch").validate().is_ok());
        assert!(request(dec!(1000000000000000000000000000), "Lunch").validate().is_err());
    }
}
