//! Company approval policy
//!
//! Each company has at most one policy: the rule that decides when a claim
//! is auto-approved, and the chain of approvers by level.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use core_kernel::{CompanyId, UserId};
use crate::error::ExpenseError;

/// Approval percentage threshold, always within 1..=100
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Threshold(u8);

impl Threshold {
    /// Threshold applied when a caller does not supply one
    pub const DEFAULT: Threshold = Threshold(60);

    pub fn new(percent: u32) -> Result<Self, ExpenseError> {
        if !(1..=100).contains(&percent) {
            return Err(ExpenseError::validation(format!(
                "threshold must be between 1 and 100, got {percent}"
            )));
        }
        Ok(Threshold(percent as u8))
    }

    pub fn percent(&self) -> u32 {
        u32::from(self.0)
    }
}

impl TryFrom<u32> for Threshold {
    type Error = ExpenseError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Threshold::new(value)
    }
}

impl From<Threshold> for u32 {
    fn from(t: Threshold) -> u32 {
        t.percent()
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Discriminant of an [`ApprovalRule`], for callers that supply the rule
/// type and threshold separately
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    Percentage,
    Cfo,
    Hybrid,
}

/// When a claim is auto-approved before the chain is exhausted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule_type", rename_all = "snake_case")]
pub enum ApprovalRule {
    /// Approved once the share of approvers who approved reaches the threshold
    Percentage { threshold: Threshold },
    /// Approved as soon as a CFO-flagged approver approves
    Cfo,
    /// Approved on a CFO approval or on reaching the threshold
    Hybrid { threshold: Threshold },
}

impl ApprovalRule {
    /// Builds a rule from a type and an optional threshold percentage
    ///
    /// A missing threshold falls back to [`Threshold::DEFAULT`]; the CFO rule
    /// ignores it.
    pub fn from_parts(rule_type: RuleType, threshold: Option<u32>) -> Result<Self, ExpenseError> {
        let threshold = threshold.map(Threshold::new).transpose()?;
        Ok(match rule_type {
            RuleType::Percentage => ApprovalRule::Percentage {
                threshold: threshold.unwrap_or(Threshold::DEFAULT),
            },
            RuleType::Cfo => ApprovalRule::Cfo,
            RuleType::Hybrid => ApprovalRule::Hybrid {
                threshold: threshold.unwrap_or(Threshold::DEFAULT),
            },
        })
    }

    pub fn rule_type(&self) -> RuleType {
        match self {
            ApprovalRule::Percentage { .. } => RuleType::Percentage,
            ApprovalRule::Cfo => RuleType::Cfo,
            ApprovalRule::Hybrid { .. } => RuleType::Hybrid,
        }
    }

    pub fn threshold(&self) -> Option<Threshold> {
        match self {
            ApprovalRule::Percentage { threshold } | ApprovalRule::Hybrid { threshold } => {
                Some(*threshold)
            }
            ApprovalRule::Cfo => None,
        }
    }

    /// Returns true if the rule compares an approval ratio
    pub fn uses_ratio(&self) -> bool {
        self.threshold().is_some()
    }
}

/// One approver in a company's chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyApprover {
    pub user_id: UserId,
    /// Chain position; 1 is reviewed first
    pub level: u32,
    /// Free-text role shown to users, e.g. "Finance"
    pub display_role: String,
    #[serde(default)]
    pub is_cfo: bool,
}

impl PolicyApprover {
    pub fn new(user_id: UserId, level: u32, display_role: impl Into<String>) -> Self {
        Self {
            user_id,
            level,
            display_role: display_role.into(),
            is_cfo: false,
        }
    }

    /// Flags this approver as the CFO
    pub fn cfo(mut self) -> Self {
        self.is_cfo = true;
        self
    }
}

/// A company's approval policy
///
/// Approvers keep the order in which they were defined; that order breaks
/// ties when several approvers share a level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalPolicy {
    company_id: CompanyId,
    rule: ApprovalRule,
    approvers: Vec<PolicyApprover>,
    updated_at: DateTime<Utc>,
}

impl ApprovalPolicy {
    /// Creates a validated policy
    pub fn new(
        company_id: CompanyId,
        rule: ApprovalRule,
        approvers: Vec<PolicyApprover>,
    ) -> Result<Self, ExpenseError> {
        validate(&rule, &approvers)?;
        Ok(Self {
            company_id,
            rule,
            approvers,
            updated_at: Utc::now(),
        })
    }

    pub fn company_id(&self) -> CompanyId {
        self.company_id
    }

    pub fn rule(&self) -> ApprovalRule {
        self.rule
    }

    /// Approvers in definition order
    pub fn approvers(&self) -> &[PolicyApprover] {
        &self.approvers
    }

    pub fn total_approvers(&self) -> usize {
        self.approvers.len()
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns true if `user_id` is a CFO-flagged approver
    pub fn is_cfo(&self, user_id: UserId) -> bool {
        self.approvers
            .iter()
            .any(|a| a.user_id == user_id && a.is_cfo)
    }

    /// Deepest level with an approver
    pub fn highest_level(&self) -> Option<u32> {
        self.approvers.iter().map(|a| a.level).max()
    }

    /// Adds an approver to the end of the chain definition
    pub fn add_approver(&mut self, approver: PolicyApprover) -> Result<(), ExpenseError> {
        let mut approvers = self.approvers.clone();
        approvers.push(approver);
        validate(&self.rule, &approvers)?;
        self.approvers = approvers;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Removes a user from the chain; returns false if they were not in it
    pub fn remove_approver(&mut self, user_id: UserId) -> Result<bool, ExpenseError> {
        let approvers: Vec<_> = self
            .approvers
            .iter()
            .filter(|a| a.user_id != user_id)
            .cloned()
            .collect();
        if approvers.len() == self.approvers.len() {
            return Ok(false);
        }
        validate(&self.rule, &approvers)?;
        self.approvers = approvers;
        self.updated_at = Utc::now();
        Ok(true)
    }
}

fn validate(rule: &ApprovalRule, approvers: &[PolicyApprover]) -> Result<(), ExpenseError> {
    if rule.uses_ratio() && approvers.is_empty() {
        return Err(ExpenseError::validation(
            "percentage and hybrid rules need at least one approver",
        ));
    }

    let mut seen = HashSet::new();
    for approver in approvers {
        if approver.level == 0 {
            return Err(ExpenseError::validation(format!(
                "approver {} has level 0; levels start at 1",
                approver.user_id
            )));
        }
        if !seen.insert(approver.user_id) {
            return Err(ExpenseError::validation(format!(
                "approver {} appears more than once",
                approver.user_id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_bounds() {
        assert!(Threshold::new(0).is_err());
        assert!(Threshold::new(101).is_err());
        assert_eq!(Threshold::new(1).unwrap().percent(), 1);
        assert_eq!(Threshold::new(100).unwrap().percent(), 100);
    }

    #[test]
    fn test_rule_from_parts_defaults_threshold() {
        let rule = ApprovalRule::from_parts(RuleType::Hybrid, None).unwrap();
        assert_eq!(rule.threshold(), Some(Threshold::DEFAULT));
        assert_eq!(ApprovalRule::from_parts(RuleType::Cfo, Some(80)).unwrap(), ApprovalRule::Cfo);
    }

    #[test]
    fn test_rule_serialization_is_tagged() {
        let rule = ApprovalRule::Percentage { threshold: Threshold::new(75).unwrap() };
        let json = serde_json::to_value(rule).unwrap();
        assert_eq!(json["rule_type"], "percentage");
        assert_eq!(json["threshold"], 75);

        let bad = serde_json::json!({ "rule_type": "percentage", "threshold": 0 });
        assert!(serde_json::from_value::<ApprovalRule>(bad).is_err());
    }

    #[test]
    fn test_percentage_rule_needs_approvers() {
        let rule = ApprovalRule::Percentage { threshold: Threshold::DEFAULT };
        assert!(ApprovalPolicy::new(CompanyId::new(), rule, vec![]).is_err());
        assert!(ApprovalPolicy::new(CompanyId::new(), ApprovalRule::Cfo, vec![]).is_ok());
    }

    #[test]
    fn test_duplicate_approver_rejected() {
        let user = UserId::new();
        let approvers = vec![
            PolicyApprover::new(user, 1, "Manager"),
            PolicyApprover::new(user, 2, "Finance"),
        ];
        let result = ApprovalPolicy::new(CompanyId::new(), ApprovalRule::Cfo, approvers);
        assert!(matches!(result, Err(ExpenseError::Validation(_))));
    }

    #[test]
    fn test_level_zero_rejected() {
        let approvers = vec![PolicyApprover::new(UserId::new(), 0, "Manager")];
        assert!(ApprovalPolicy::new(CompanyId::new(), ApprovalRule::Cfo, approvers).is_err());
    }

    #[test]
    fn test_add_and_remove_approver() {
        let first = UserId::new();
        let mut policy = ApprovalPolicy::new(
            CompanyId::new(),
            ApprovalRule::Hybrid { threshold: Threshold::DEFAULT },
            vec![PolicyApprover::new(first, 1, "Manager")],
        )
        .unwrap();

        let cfo = UserId::new();
        policy.add_approver(PolicyApprover::new(cfo, 2, "CFO").cfo()).unwrap();
        assert!(policy.is_cfo(cfo));
        assert_eq!(policy.highest_level(), Some(2));
        assert!(policy.add_approver(PolicyApprover::new(cfo, 3, "Again")).is_err());

        assert!(policy.remove_approver(cfo).unwrap());
        assert!(!policy.remove_approver(cfo).unwrap());
        // The last approver of a ratio rule cannot be removed
        assert!(policy.remove_approver(first).is_err());
    }
}
