//! Auto-approval evaluation
//!
//! Decides, after each approval, whether the company's policy is already
//! satisfied so the rest of the chain can be skipped. Evaluation is a pure
//! function of its inputs.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use std::fmt;

use crate::error::ExpenseError;
use crate::ledger::AuditLedger;
use crate::policy::{ApprovalPolicy, ApprovalRule, Threshold};

/// Approval counts fed to the evaluator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApprovalTally {
    /// Personal approvals recorded on the claim
    pub approval_count: usize,
    /// Size of the policy's approver set, or 1 without a policy
    pub total_approvers: usize,
}

impl ApprovalTally {
    pub fn new(approval_count: usize, total_approvers: usize) -> Self {
        Self {
            approval_count,
            total_approvers,
        }
    }

    /// Counts approvals in `history` against `policy`
    pub fn from_history(policy: Option<&ApprovalPolicy>, history: &AuditLedger) -> Self {
        Self {
            approval_count: history.approval_count(),
            total_approvers: policy.map_or(1, ApprovalPolicy::total_approvers),
        }
    }

    /// `approval_count / total_approvers * 100`, unrounded
    pub fn percentage(&self) -> Option<Decimal> {
        if self.total_approvers == 0 {
            return None;
        }
        Some(Decimal::from(self.approval_count) * dec!(100) / Decimal::from(self.total_approvers))
    }

    /// Exact `percentage >= threshold` test, done in integers
    fn reaches(&self, threshold: Threshold) -> bool {
        let reached = self.approval_count as u128 * 100;
        let required = u128::from(threshold.percent()) * self.total_approvers as u128;
        reached >= required
    }
}

/// Why the evaluator decided as it did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationReason {
    NoPolicy,
    CfoApproved { hybrid: bool },
    ThresholdReached { percentage: Decimal, hybrid: bool },
    AwaitingApprovals,
}

impl fmt::Display for EvaluationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = |hybrid: bool| if hybrid { " (hybrid rule)" } else { "" };
        match self {
            EvaluationReason::NoPolicy => f.write_str("no policy configured"),
            EvaluationReason::CfoApproved { hybrid } => {
                write!(f, "CFO approved{}", suffix(*hybrid))
            }
            EvaluationReason::ThresholdReached { percentage, hybrid } => {
                let shown = percentage
                    .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                    .normalize();
                write!(f, "{}% approval threshold reached{}", shown, suffix(*hybrid))
            }
            EvaluationReason::AwaitingApprovals => f.write_str("awaiting more approvals"),
        }
    }
}

/// Outcome of an evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub auto_approve: bool,
    pub reason: EvaluationReason,
}

impl Evaluation {
    fn approve(reason: EvaluationReason) -> Self {
        Self {
            auto_approve: true,
            reason,
        }
    }

    fn hold(reason: EvaluationReason) -> Self {
        Self {
            auto_approve: false,
            reason,
        }
    }
}

/// Applies a policy's rule to a claim's approvals
pub struct AutoApprovalEvaluator;

impl AutoApprovalEvaluator {
    /// Decides whether the claim should be approved now
    ///
    /// # Errors
    ///
    /// Returns `PolicyMisconfiguration` when a ratio rule has to be checked
    /// against a policy with zero approvers.
    pub fn evaluate(
        policy: Option<&ApprovalPolicy>,
        history: &AuditLedger,
        tally: ApprovalTally,
    ) -> Result<Evaluation, ExpenseError> {
        let Some(policy) = policy else {
            return Ok(Evaluation::hold(EvaluationReason::NoPolicy));
        };

        let cfo_approved = history.approvals().any(|e| policy.is_cfo(e.approver_id));

        match policy.rule() {
            ApprovalRule::Cfo => Ok(if cfo_approved {
                Evaluation::approve(EvaluationReason::CfoApproved { hybrid: false })
            } else {
                Evaluation::hold(EvaluationReason::AwaitingApprovals)
            }),
            ApprovalRule::Percentage { threshold } => {
                Self::check_ratio(tally, threshold, false)
            }
            ApprovalRule::Hybrid { threshold } => {
                if cfo_approved {
                    return Ok(Evaluation::approve(EvaluationReason::CfoApproved { hybrid: true }));
                }
                Self::check_ratio(tally, threshold, true)
            }
        }
    }

    fn check_ratio(
        tally: ApprovalTally,
        threshold: Threshold,
        hybrid: bool,
    ) -> Result<Evaluation, ExpenseError> {
        let percentage = tally.percentage().ok_or_else(|| {
            ExpenseError::misconfigured("approval ratio required but the policy has no approvers")
        })?;

        if tally.reaches(threshold) {
            Ok(Evaluation::approve(EvaluationReason::ThresholdReached { percentage, hybrid }))
        } else {
            Ok(Evaluation::hold(EvaluationReason::AwaitingApprovals))
        }
    }
}
