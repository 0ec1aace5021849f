//! Property tests for the auto-approval evaluator

use proptest::prelude::*;
use rust_decimal::Decimal;

use core_kernel::{CompanyId, UserId};

use domain_expense::{
    ApprovalPolicy, ApprovalRule, ApprovalTally, AuditEntry, AuditLedger, AutoApprovalEvaluator,
    PolicyApprover, Threshold,
};

fn policy_of(size: usize, rule: ApprovalRule) -> (ApprovalPolicy, Vec<UserId>) {
    let ids: Vec<UserId> = (0..size).map(|_| UserId::new()).collect();
    let approvers = ids
        .iter()
        .enumerate()
        .map(|(i, id)| PolicyApprover::new(*id, i as u32 + 1, "Approver"))
        .collect();
    let policy = ApprovalPolicy::new(CompanyId::new(), rule, approvers).unwrap();
    (policy, ids)
}

fn ledger_of(approvers: &[UserId]) -> AuditLedger {
    let mut ledger = AuditLedger::new();
    ledger.append(AuditEntry::submitted(UserId::new(), "Claimant", "Expense submitted for approval"));
    for id in approvers {
        ledger.append(AuditEntry::approved(*id, "Approver", "Approved"));
    }
    ledger
}

proptest! {
    #[test]
    fn percentage_rule_matches_decimal_comparison(
        total in 1usize..12,
        approved in 0usize..12,
        threshold in 1u32..=100,
    ) {
        let approved = approved.min(total);
        let (policy, ids) = policy_of(total, ApprovalRule::Percentage {
            threshold: Threshold::new(threshold).unwrap(),
        });
        let history = ledger_of(&ids[..approved]);
        let tally = ApprovalTally::from_history(Some(&policy), &history);
        prop_assert_eq!(tally.approval_count, approved);

        let eval = AutoApprovalEvaluator::evaluate(Some(&policy), &history, tally).unwrap();
        let expected = Decimal::from(approved * 100) >= Decimal::from(threshold) * Decimal::from(total);
        prop_assert_eq!(eval.auto_approve, expected);
    }

    #[test]
    fn more_approvals_never_undo_auto_approval(
        total in 1usize..10,
        threshold in 1u32..=100,
    ) {
        let (policy, ids) = policy_of(total, ApprovalRule::Hybrid {
            threshold: Threshold::new(threshold).unwrap(),
        });
        let mut approved_once = false;
        for n in 0..=total {
            let history = ledger_of(&ids[..n]);
            let tally = ApprovalTally::from_history(Some(&policy), &history);
            let eval = AutoApprovalEvaluator::evaluate(Some(&policy), &history, tally).unwrap();
            if approved_once {
                prop_assert!(eval.auto_approve);
            }
            approved_once |= eval.auto_approve;
        }
        prop_assert!(approved_once);
    }

    #[test]
    fn system_entries_do_not_count(extra in 0usize..5) {
        let (policy, ids) = policy_of(4, ApprovalRule::Percentage {
            threshold: Threshold::new(50).unwrap(),
        });
        let mut history = ledger_of(&ids[..1]);
        for _ in 0..extra {
            history.append(AuditEntry::system_approval(ids[0], "Administrative override"));
        }
        let tally = ApprovalTally::from_history(Some(&policy), &history);
        prop_assert_eq!(tally.approval_count, 1);
        prop_assert!(!AutoApprovalEvaluator::evaluate(Some(&policy), &history, tally).unwrap().auto_approve);
    }
}
