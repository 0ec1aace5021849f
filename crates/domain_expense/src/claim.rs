//! Expense claim aggregate

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::{ClaimId, CompanyId, Money, UserId};
use crate::error::ExpenseError;
use crate::ledger::{AuditEntry, AuditLedger};

/// Largest amount a single claim may carry, in the submitted currency
pub const MAX_CLAIM_AMOUNT: Decimal = dec!(1000000000);

/// Claim status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClaimStatus {
    /// Submitted, waiting on the first approver
    Pending,
    /// Approved at least once, waiting on a later level
    InReview,
    /// Finalized as approved
    Approved,
    /// Finalized as rejected
    Rejected,
}

impl ClaimStatus {
    /// Returns true for `Approved` and `Rejected`
    pub fn is_terminal(&self) -> bool {
        matches!(self, ClaimStatus::Approved | ClaimStatus::Rejected)
    }

    /// Returns true while the claim still awaits a decision
    pub fn is_open(&self) -> bool {
        !self.is_terminal()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Pending => "Pending",
            ClaimStatus::InReview => "InReview",
            ClaimStatus::Approved => "Approved",
            ClaimStatus::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ClaimStatus {
    type Err = ExpenseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(ClaimStatus::Pending),
            "InReview" => Ok(ClaimStatus::InReview),
            "Approved" => Ok(ClaimStatus::Approved),
            "Rejected" => Ok(ClaimStatus::Rejected),
            other => Err(ExpenseError::validation(format!("unknown claim status '{other}'"))),
        }
    }
}

/// Expense category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpenseCategory {
    Travel,
    Food,
    Accommodation,
    Transportation,
    OfficeSupplies,
    Entertainment,
    Other,
}

/// Data supplied by the claimant when submitting a claim
#[derive(Debug, Clone)]
pub struct SubmitClaim {
    pub claimant_id: UserId,
    pub company_id: CompanyId,
    pub amount: Money,
    pub category: ExpenseCategory,
    pub description: String,
    pub merchant: Option<String>,
    pub expense_date: NaiveDate,
    pub receipt_ref: Option<String>,
}

impl SubmitClaim {
    /// Checks the claimant-supplied fields
    pub fn validate(&self) -> Result<(), ExpenseError> {
        if !self.amount.is_positive() {
            return Err(ExpenseError::validation("amount must be greater than zero"));
        }
        if self.amount.amount() > MAX_CLAIM_AMOUNT {
            return Err(ExpenseError::validation(format!(
                "amount must not exceed {MAX_CLAIM_AMOUNT}"
            )));
        }
        if self.description.trim().is_empty() {
            return Err(ExpenseError::validation("description is required"));
        }
        Ok(())
    }
}

/// An expense reimbursement claim moving through the approval chain
///
/// Identity and expense details are public. Lifecycle state (status, level,
/// current approver, history, version) only changes through the workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseClaim {
    /// Unique identifier
    pub id: ClaimId,
    /// Employee who submitted the claim
    pub claimant_id: UserId,
    pub company_id: CompanyId,
    /// Amount as submitted
    pub amount: Money,
    /// Amount in the company's currency
    pub converted_amount: Money,
    pub category: ExpenseCategory,
    pub description: String,
    pub merchant: Option<String>,
    /// Date the expense was incurred
    pub expense_date: NaiveDate,
    /// Reference to a stored receipt image
    pub receipt_ref: Option<String>,
    status: ClaimStatus,
    current_level: u32,
    current_approver_id: Option<UserId>,
    history: AuditLedger,
    version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ExpenseClaim {
    /// Creates a new claim in `Pending` at level 1
    pub(crate) fn submit(
        request: SubmitClaim,
        converted_amount: Money,
        first_approver: Option<UserId>,
        submitted: AuditEntry,
    ) -> Self {
        let now = Utc::now();
        let mut history = AuditLedger::new();
        history.append(submitted);

        Self {
            id: ClaimId::new_v7(),
            claimant_id: request.claimant_id,
            company_id: request.company_id,
            amount: request.amount,
            converted_amount,
            category: request.category,
            description: request.description,
            merchant: request.merchant.filter(|m| !m.trim().is_empty()),
            expense_date: request.expense_date,
            receipt_ref: request.receipt_ref.filter(|r| !r.trim().is_empty()),
            status: ClaimStatus::Pending,
            current_level: 1,
            current_approver_id: first_approver,
            history,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn status(&self) -> ClaimStatus {
        self.status
    }

    /// Position in the approver chain, starting at 1
    pub fn current_level(&self) -> u32 {
        self.current_level
    }

    pub fn current_approver_id(&self) -> Option<UserId> {
        self.current_approver_id
    }

    pub fn history(&self) -> &AuditLedger {
        &self.history
    }

    /// Optimistic concurrency tag, incremented on every stored change
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Fails with `InvalidStateTransition` once the claim is terminal
    pub fn ensure_open(&self) -> Result<(), ExpenseError> {
        if self.status.is_terminal() {
            return Err(ExpenseError::InvalidStateTransition {
                claim_id: self.id,
                status: self.status,
            });
        }
        Ok(())
    }

    pub(crate) fn record(&mut self, entry: AuditEntry) {
        self.history.append(entry);
        self.touch();
    }

    /// Moves the claim to the next level of the chain
    pub(crate) fn advance(&mut self, level: u32, approver: Option<UserId>) {
        debug_assert!(level > self.current_level);
        self.status = ClaimStatus::InReview;
        self.current_level = level;
        self.current_approver_id = approver;
        self.touch();
    }

    pub(crate) fn finalize_approved(&mut self) {
        self.status = ClaimStatus::Approved;
        self.touch();
    }

    pub(crate) fn finalize_rejected(&mut self) {
        self.status = ClaimStatus::Rejected;
        self.touch();
    }

    /// Marks the in-memory copy as the successor of the stored version
    pub(crate) fn next_version(&mut self) -> u64 {
        let expected = self.version;
        self.version += 1;
        expected
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
