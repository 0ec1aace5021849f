//! Custom Test Assertions
//!
//! Assertion helpers for claims and money that give more meaningful failure
//! messages than bare `assert_eq!`.

use core_kernel::Money;
use domain_expense::{AuditAction, ClaimStatus, ExpenseClaim, ExpenseError};
use rust_decimal::Decimal;

/// Asserts that two Money values are equal within `tolerance`
///
/// # Panics
///
/// Panics if the currencies differ or the amounts differ by more than
/// `tolerance`.
pub fn assert_money_approx_eq(actual: &Money, expected: &Money, tolerance: Decimal) {
    assert_eq!(
        actual.currency(),
        expected.currency(),
        "Currency mismatch: actual={}, expected={}",
        actual.currency(),
        expected.currency()
    );

    let diff = (actual.amount() - expected.amount()).abs();
    assert!(
        diff <= tolerance,
        "Money amounts differ by more than tolerance: actual={}, expected={}, diff={}",
        actual.amount(),
        expected.amount(),
        diff
    );
}

/// Asserts the claim's status, level and current approver together
pub fn assert_claim_state(
    claim: &ExpenseClaim,
    status: ClaimStatus,
    level: u32,
    approver: Option<core_kernel::UserId>,
) {
    assert_eq!(
        (claim.status(), claim.current_level(), claim.current_approver_id()),
        (status, level, approver),
        "unexpected state for claim {}",
        claim.id
    );
}

/// Asserts the sequence of actions in a claim's history
pub fn assert_history_actions(claim: &ExpenseClaim, expected: &[AuditAction]) {
    let actions: Vec<AuditAction> = claim.history().iter().map(|e| e.action).collect();
    assert_eq!(actions, expected, "history of claim {}", claim.id);
}

/// Asserts the last history entry is a system entry with `comment`
pub fn assert_system_entry(claim: &ExpenseClaim, comment: &str) {
    let entry = claim
        .history()
        .latest()
        .unwrap_or_else(|| panic!("claim {} has no history", claim.id));
    assert!(entry.system, "last entry of claim {} is not a system entry", claim.id);
    assert_eq!(entry.comment, comment);
}

/// Asserts that an operation failed because the claim was already closed
pub fn assert_invalid_transition<T: std::fmt::Debug>(result: Result<T, ExpenseError>) {
    match result {
        Err(ExpenseError::InvalidStateTransition { .. }) => {}
        other => panic!("expected InvalidStateTransition, got {other:?}"),
    }
}
