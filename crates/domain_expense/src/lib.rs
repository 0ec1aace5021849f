//! Expense Approval Domain
//!
//! This crate implements the approval-workflow engine for expense
//! reimbursement claims: submission, multi-level approver chains, and the
//! per-company auto-approval policy that can finalize a claim early.
//!
//! # Claim Lifecycle
//!
//! ```text
//! submit -> Pending -> InReview -> ... -> Approved
//!              \           \
//!               `-----------`-------> Rejected
//! ```
//!
//! `Approved` and `Rejected` are terminal. Each approval is recorded in the
//! claim's append-only audit ledger, then the policy is evaluated; if it is
//! not yet satisfied the claim moves one level down the approver chain.

pub mod claim;
pub mod ledger;
pub mod policy;
pub mod chain;
pub mod evaluator;
pub mod ports;
pub mod workflow;
pub mod adapters;
pub mod error;

pub use claim::{ClaimStatus, ExpenseCategory, ExpenseClaim, SubmitClaim, MAX_CLAIM_AMOUNT};
pub use ledger::{AuditAction, AuditEntry, AuditLedger};
pub use policy::{ApprovalPolicy, ApprovalRule, PolicyApprover, RuleType, Threshold};
pub use chain::{ApprovalChainResolver, ChainPosition};
pub use evaluator::{ApprovalTally, AutoApprovalEvaluator, Evaluation, EvaluationReason};
pub use ports::{ClaimQuery, ClaimRepository, ClaimantProfile, DirectoryPort, PolicyRepository};
pub use workflow::{Approver, ClaimSummary, ClaimWorkflow, WorkflowConfig};
pub use error::ExpenseError;
