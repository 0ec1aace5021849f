//! Property-Based Test Generators
//!
//! Proptest strategies that produce values satisfying domain invariants.

use core_kernel::{Currency, Money};
use domain_expense::{ApprovalRule, ExpenseCategory, Threshold};
use proptest::prelude::*;

/// Strategy for supported currencies
pub fn currency_strategy() -> impl Strategy<Value = Currency> {
    proptest::sample::select(Currency::ALL.to_vec())
}

/// Strategy for positive amounts in minor units
pub fn positive_amount_minor_strategy() -> impl Strategy<Value = i64> {
    1i64..100_000_000i64
}

/// Strategy for claimable (strictly positive) money
pub fn positive_money_strategy() -> impl Strategy<Value = Money> {
    (positive_amount_minor_strategy(), currency_strategy())
        .prop_map(|(amount, currency)| Money::from_minor(amount, currency))
}

pub fn category_strategy() -> impl Strategy<Value = ExpenseCategory> {
    prop_oneof![
        Just(ExpenseCategory::Travel),
        Just(ExpenseCategory::Food),
        Just(ExpenseCategory::Accommodation),
        Just(ExpenseCategory::Transportation),
        Just(ExpenseCategory::OfficeSupplies),
        Just(ExpenseCategory::Entertainment),
        Just(ExpenseCategory::Other),
    ]
}

/// Strategy for valid thresholds (1..=100)
pub fn threshold_strategy() -> impl Strategy<Value = Threshold> {
    (1u32..=100u32).prop_filter_map("threshold out of range", |p| Threshold::new(p).ok())
}

/// Strategy for any of the three rules
pub fn rule_strategy() -> impl Strategy<Value = ApprovalRule> {
    prop_oneof![
        threshold_strategy().prop_map(|threshold| ApprovalRule::Percentage { threshold }),
        Just(ApprovalRule::Cfo),
        threshold_strategy().prop_map(|threshold| ApprovalRule::Hybrid { threshold }),
    ]
}

/// Strategy for an (approvals, chain length) pair with approvals <= length
pub fn tally_strategy() -> impl Strategy<Value = (usize, usize)> {
    (1usize..=12).prop_flat_map(|total| (0..=total, Just(total)))
}
