//! Pre-built Test Fixtures
//!
//! Provides ready-to-use test data for common entities across the expense
//! approval system. These fixtures are consistent and predictable.

use chrono::NaiveDate;
use core_kernel::{CompanyId, Currency, Money, UserId};
use domain_expense::{ApprovalRule, ClaimantProfile, Threshold};
use rust_decimal_macros::dec;

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// A typical travel expense
    pub fn usd_120() -> Money {
        Money::new(dec!(120.00), Currency::USD)
    }

    /// `usd_120` converted at the default INR rate
    pub fn inr_9960() -> Money {
        Money::new(dec!(9960.00), Currency::INR)
    }

    /// A small meal expense
    pub fn eur_45() -> Money {
        Money::new(dec!(45.00), Currency::EUR)
    }

    pub fn usd_zero() -> Money {
        Money::zero(Currency::USD)
    }

    /// Negative amounts are never valid claims
    pub fn usd_negative() -> Money {
        Money::new(dec!(-10.00), Currency::USD)
    }
}

/// Fixture for dates
pub struct DateFixtures;

impl DateFixtures {
    pub fn expense_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 14).unwrap_or_default()
    }
}

/// Fixture for approval rules
pub struct RuleFixtures;

impl RuleFixtures {
    pub fn percentage(percent: u32) -> ApprovalRule {
        ApprovalRule::Percentage {
            threshold: threshold(percent),
        }
    }

    pub fn hybrid(percent: u32) -> ApprovalRule {
        ApprovalRule::Hybrid {
            threshold: threshold(percent),
        }
    }

    pub fn cfo() -> ApprovalRule {
        ApprovalRule::Cfo
    }
}

fn threshold(percent: u32) -> Threshold {
    Threshold::new(percent).unwrap_or(Threshold::DEFAULT)
}

/// Fixture for directory profiles
pub struct ProfileFixtures;

impl ProfileFixtures {
    pub fn profile(
        user_id: UserId,
        name: &str,
        company_id: CompanyId,
        manager_id: Option<UserId>,
    ) -> ClaimantProfile {
        ClaimantProfile {
            user_id,
            display_name: name.to_string(),
            company_id,
            manager_id,
        }
    }
}
