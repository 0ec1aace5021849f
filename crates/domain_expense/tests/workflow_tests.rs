//! Workflow tests for domain_expense

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use core_kernel::{ClaimId, CompanyId, Currency, Money, UserId};

use domain_expense::adapters::memory::{
    InMemoryClaimRepository, InMemoryDirectory, InMemoryPolicyRepository,
};
use domain_expense::{
    ApprovalRule, Approver, AuditAction, ClaimRepository, ClaimStatus, ClaimWorkflow,
    ClaimantProfile, ExpenseCategory, ExpenseClaim, ExpenseError, PolicyApprover, SubmitClaim,
    Threshold,
};

/// A company with a manager, an admin, a finance approver and a CFO
struct Harness {
    workflow: ClaimWorkflow,
    claims: Arc<InMemoryClaimRepository>,
    directory: Arc<InMemoryDirectory>,
    company_id: CompanyId,
    claimant: UserId,
    manager: UserId,
    finance: UserId,
    cfo: UserId,
    admin: UserId,
}

impl Harness {
    async fn new() -> Self {
        let company_id = CompanyId::new();
        let (claimant, manager, finance, cfo, admin) =
            (UserId::new(), UserId::new(), UserId::new(), UserId::new(), UserId::new());

        let directory = Arc::new(InMemoryDirectory::new());
        directory.add_company(company_id, Currency::INR).await;
        directory
            .add_user(profile(claimant, "Ana", company_id, Some(manager)), false)
            .await;
        directory
            .add_user(profile(manager, "Raj", company_id, None), false)
            .await;
        directory
            .add_user(profile(finance, "Li", company_id, None), false)
            .await;
        directory
            .add_user(profile(cfo, "Sam", company_id, None), false)
            .await;
        directory
            .add_user(profile(admin, "Mei", company_id, None), true)
            .await;

        let claims = Arc::new(InMemoryClaimRepository::new());
        let workflow = ClaimWorkflow::new(
            claims.clone(),
            Arc::new(InMemoryPolicyRepository::new()),
            directory.clone(),
        );

        Self {
            workflow,
            claims,
            directory,
            company_id,
            claimant,
            manager,
            finance,
            cfo,
            admin,
        }
    }

    /// Manager at level 1, finance at level 2, CFO at level 3
    async fn with_policy(self, rule: ApprovalRule) -> Self {
        self.workflow
            .set_policy(
                self.company_id,
                rule,
                vec![
                    PolicyApprover::new(self.manager, 1, "Manager"),
                    PolicyApprover::new(self.finance, 2, "Finance"),
                    PolicyApprover::new(self.cfo, 3, "CFO").cfo(),
                ],
            )
            .await
            .unwrap();
        self
    }

    fn request(&self) -> SubmitClaim {
        SubmitClaim {
            claimant_id: self.claimant,
            company_id: self.company_id,
            amount: Money::new(dec!(120.00), Currency::USD),
            category: ExpenseCategory::Travel,
            description: "Client visit train fare".to_string(),
            merchant: Some("Rail Co".to_string()),
            expense_date: NaiveDate::from_ymd_opt(2024, 3, 14).unwrap(),
            receipt_ref: None,
        }
    }

    async fn submit(&self) -> ExpenseClaim {
        self.workflow.submit(self.request()).await.unwrap()
    }

    async fn stored(&self, claim: &ExpenseClaim) -> ExpenseClaim {
        self.claims.get(claim.id).await.unwrap().unwrap()
    }
}

fn profile(user_id: UserId, name: &str, company_id: CompanyId, manager_id: Option<UserId>) -> ClaimantProfile {
    ClaimantProfile {
        user_id,
        display_name: name.to_string(),
        company_id,
        manager_id,
    }
}

fn percentage(threshold: u32) -> ApprovalRule {
    ApprovalRule::Percentage { threshold: Threshold::new(threshold).unwrap() }
}

fn hybrid(threshold: u32) -> ApprovalRule {
    ApprovalRule::Hybrid { threshold: Threshold::new(threshold).unwrap() }
}

fn approver(id: UserId) -> Approver {
    Approver::new(id, "Approver")
}

// ============================================================================
// Submission
// ============================================================================

mod submit_tests {
    use super::*;

    #[tokio::test]
    async fn test_submit_assigns_manager_at_level_one() {
        let h = Harness::new().await;
        let claim = h.submit().await;

        assert_eq!(claim.status(), ClaimStatus::Pending);
        assert_eq!(claim.current_level(), 1);
        assert_eq!(claim.current_approver_id(), Some(h.manager));
        assert_eq!(claim.version(), 1);

        let entries = claim.history().entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, AuditAction::Submitted);
        assert_eq!(entries[0].comment, "Expense submitted for approval");
        assert_eq!(h.stored(&claim).await, claim);
    }

    #[tokio::test]
    async fn test_submit_converts_to_company_currency() {
        let h = Harness::new().await;
        let claim = h.submit().await;

        assert_eq!(claim.amount, Money::new(dec!(120.00), Currency::USD));
        assert_eq!(claim.converted_amount, Money::new(dec!(9960.00), Currency::INR));
    }

    #[tokio::test]
    async fn test_submit_falls_back_to_company_admin() {
        let h = Harness::new().await;
        let orphan = UserId::new();
        h.directory
            .add_user(profile(orphan, "Lee", h.company_id, None), false)
            .await;

        let claim = h
            .workflow
            .submit(SubmitClaim { claimant_id: orphan, ..h.request() })
            .await
            .unwrap();
        assert_eq!(claim.current_approver_id(), Some(h.admin));
    }

    #[tokio::test]
    async fn test_submit_rejects_invalid_requests() {
        let h = Harness::new().await;

        let zero = SubmitClaim { amount: Money::zero(Currency::USD), ..h.request() };
        assert!(matches!(h.workflow.submit(zero).await, Err(ExpenseError::Validation(_))));

        let blank = SubmitClaim { description: "   ".to_string(), ..h.request() };
        assert!(matches!(h.workflow.submit(blank).await, Err(ExpenseError::Validation(_))));

        let stranger = SubmitClaim { claimant_id: UserId::new(), ..h.request() };
        assert!(h.workflow.submit(stranger).await.unwrap_err().is_not_found());

        let other_company = SubmitClaim { company_id: CompanyId::new(), ..h.request() };
        assert!(matches!(
            h.workflow.submit(other_company).await,
            Err(ExpenseError::Validation(_))
        ));

        assert!(h.claims.is_empty().await);
    }
}

// ============================================================================
// Approval
// ============================================================================

mod approve_tests {
    use super::*;

    #[tokio::test]
    async fn test_scenario_percentage_threshold_reached() {
        let h = Harness::new().await.with_policy(percentage(60)).await;
        let claim = h.submit().await;

        let claim = h.workflow.approve(claim.id, &approver(h.manager), None).await.unwrap();
        assert_eq!(claim.status(), ClaimStatus::InReview);
        assert_eq!(claim.current_level(), 2);
        assert_eq!(claim.current_approver_id(), Some(h.finance));

        let claim = h.workflow.approve(claim.id, &approver(h.finance), None).await.unwrap();
        assert_eq!(claim.status(), ClaimStatus::Approved);

        let system = claim.history().latest().unwrap();
        assert!(system.system);
        assert_eq!(system.comment, "67% approval threshold reached");
        assert_eq!(claim.history().approval_count(), 2);
    }

    #[tokio::test]
    async fn test_scenario_hybrid_cfo_approval() {
        let h = Harness::new().await.with_policy(hybrid(80)).await;
        let claim = h.submit().await;

        let claim = h.workflow.approve(claim.id, &approver(h.manager), None).await.unwrap();
        assert_eq!(claim.status(), ClaimStatus::InReview);
        assert_eq!(claim.current_level(), 2);

        let claim = h.workflow.approve(claim.id, &approver(h.cfo), Some("ok")).await.unwrap();
        assert_eq!(claim.status(), ClaimStatus::Approved);
        assert_eq!(claim.history().latest().unwrap().comment, "CFO approved (hybrid rule)");
    }

    #[tokio::test]
    async fn test_cfo_rule_ignores_other_approvals() {
        let h = Harness::new().await.with_policy(ApprovalRule::Cfo).await;
        let claim = h.submit().await;

        let claim = h.workflow.approve(claim.id, &approver(h.manager), None).await.unwrap();
        let claim = h.workflow.approve(claim.id, &approver(h.finance), None).await.unwrap();
        assert_eq!(claim.status(), ClaimStatus::InReview);
        assert_eq!(claim.current_approver_id(), Some(h.cfo));

        let claim = h.workflow.approve(claim.id, &approver(h.cfo), None).await.unwrap();
        assert_eq!(claim.status(), ClaimStatus::Approved);
        assert_eq!(claim.history().latest().unwrap().comment, "CFO approved");
    }

    #[tokio::test]
    async fn test_each_non_final_approval_advances_one_level() {
        let h = Harness::new().await.with_policy(percentage(100)).await;
        let claim = h.submit().await;

        let mut current = claim;
        for (expected_level, next) in [(2, h.finance), (3, h.cfo)] {
            let before = current.current_level();
            current = h
                .workflow
                .approve(current.id, &approver(UserId::new()), None)
                .await
                .unwrap();
            assert_eq!(current.current_level(), before + 1);
            assert_eq!(current.current_level(), expected_level);
            assert_eq!(current.current_approver_id(), Some(next));
        }
    }

    #[tokio::test]
    async fn test_chain_exhaustion_finalizes_approved() {
        let h = Harness::new().await;
        h.workflow
            .set_policy(h.company_id, ApprovalRule::Cfo, vec![PolicyApprover::new(h.finance, 2, "Finance")])
            .await
            .unwrap();
        let claim = h.submit().await;

        let claim = h.workflow.approve(claim.id, &approver(h.manager), None).await.unwrap();
        assert_eq!(claim.current_approver_id(), Some(h.finance));

        let claim = h.workflow.approve(claim.id, &approver(h.finance), None).await.unwrap();
        assert_eq!(claim.status(), ClaimStatus::Approved);
        assert_eq!(claim.current_level(), 3);
        assert_eq!(claim.current_approver_id(), None);
        assert_eq!(claim.history().latest().unwrap().comment, "Approval chain completed");
    }

    #[tokio::test]
    async fn test_no_policy_single_approval_completes_chain() {
        let h = Harness::new().await;
        let claim = h.submit().await;

        let claim = h.workflow.approve(claim.id, &approver(h.manager), None).await.unwrap();
        assert_eq!(claim.status(), ClaimStatus::Approved);
        assert_eq!(claim.history().approval_count(), 1);
    }

    #[tokio::test]
    async fn test_vacant_level_leaves_claim_unassigned() {
        let h = Harness::new().await;
        h.workflow
            .set_policy(
                h.company_id,
                percentage(100),
                vec![
                    PolicyApprover::new(h.manager, 1, "Manager"),
                    PolicyApprover::new(h.cfo, 3, "CFO").cfo(),
                ],
            )
            .await
            .unwrap();
        let claim = h.submit().await;

        let claim = h.workflow.approve(claim.id, &approver(h.manager), None).await.unwrap();
        assert_eq!(claim.status(), ClaimStatus::InReview);
        assert_eq!(claim.current_level(), 2);
        assert_eq!(claim.current_approver_id(), None);
    }

    #[tokio::test]
    async fn test_shared_level_assigns_first_defined_approver() {
        let h = Harness::new().await;
        h.workflow
            .set_policy(
                h.company_id,
                percentage(100),
                vec![
                    PolicyApprover::new(h.manager, 1, "Manager"),
                    PolicyApprover::new(h.finance, 2, "Finance"),
                    PolicyApprover::new(h.cfo, 2, "CFO"),
                ],
            )
            .await
            .unwrap();
        let claim = h.submit().await;

        let claim = h.workflow.approve(claim.id, &approver(h.manager), None).await.unwrap();
        assert_eq!(claim.current_approver_id(), Some(h.finance));
    }

    #[tokio::test]
    async fn test_scenario_approving_terminal_claim_fails_without_change() {
        let h = Harness::new().await;
        let claim = h.submit().await;
        let approved = h.workflow.approve(claim.id, &approver(h.manager), None).await.unwrap();
        assert_eq!(approved.status(), ClaimStatus::Approved);

        let err = h
            .workflow
            .approve(claim.id, &approver(h.finance), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ExpenseError::InvalidStateTransition { status: ClaimStatus::Approved, .. }
        ));
        assert_eq!(h.stored(&claim).await, approved);
    }

    #[tokio::test]
    async fn test_approve_unknown_claim_is_not_found() {
        let h = Harness::new().await;
        let err = h
            .workflow
            .approve(ClaimId::new(), &approver(h.manager), None)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_force_approve_skips_policy() {
        let h = Harness::new().await.with_policy(percentage(100)).await;
        let claim = h.submit().await;

        let claim = h
            .workflow
            .force_approve(claim.id, &Approver::new(h.admin, "Mei"), None)
            .await
            .unwrap();
        assert_eq!(claim.status(), ClaimStatus::Approved);
        assert_eq!(claim.current_level(), 1);

        let entries = claim.history().entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1].approver_id, h.admin);
        assert_eq!(entries[1].comment, "Approved");
        assert!(entries[2].system);
        assert_eq!(entries[2].comment, "Administrative override");
    }
}

// ============================================================================
// Rejection
// ============================================================================

mod reject_tests {
    use super::*;

    #[tokio::test]
    async fn test_scenario_empty_comment_defaults_to_rejected() {
        let h = Harness::new().await.with_policy(percentage(60)).await;
        let claim = h.submit().await;

        let claim = h.workflow.reject(claim.id, &approver(h.manager), Some("")).await.unwrap();
        assert_eq!(claim.status(), ClaimStatus::Rejected);

        let entry = claim.history().latest().unwrap();
        assert_eq!(entry.action, AuditAction::Rejected);
        assert_eq!(entry.comment, "Rejected");
        assert_eq!(h.stored(&claim).await.history().latest().unwrap().comment, "Rejected");
    }

    #[tokio::test]
    async fn test_reject_from_review_is_terminal() {
        let h = Harness::new().await.with_policy(percentage(100)).await;
        let claim = h.submit().await;
        let claim = h.workflow.approve(claim.id, &approver(h.manager), None).await.unwrap();

        let rejected = h
            .workflow
            .reject(claim.id, &approver(h.finance), Some("Missing receipt"))
            .await
            .unwrap();
        assert_eq!(rejected.status(), ClaimStatus::Rejected);
        assert_eq!(rejected.current_level(), claim.current_level());
        assert_eq!(rejected.history().len(), claim.history().len() + 1);

        for err in [
            h.workflow.reject(claim.id, &approver(h.cfo), None).await.unwrap_err(),
            h.workflow.approve(claim.id, &approver(h.cfo), None).await.unwrap_err(),
            h.workflow.force_approve(claim.id, &approver(h.admin), None).await.unwrap_err(),
        ] {
            assert!(matches!(err, ExpenseError::InvalidStateTransition { .. }));
        }
        assert_eq!(h.stored(&claim).await, rejected);
    }
}

// ============================================================================
// Policy administration
// ============================================================================

mod policy_tests {
    use super::*;

    #[tokio::test]
    async fn test_policy_lifecycle() {
        let h = Harness::new().await;
        assert!(h.workflow.get_policy(h.company_id).await.unwrap_err().is_not_found());

        let h = h.with_policy(percentage(60)).await;
        assert_eq!(h.workflow.get_policy(h.company_id).await.unwrap().total_approvers(), 3);

        let director = UserId::new();
        h.directory
            .add_user(profile(director, "Kim", h.company_id, None), false)
            .await;
        let policy = h
            .workflow
            .add_approver(h.company_id, PolicyApprover::new(director, 4, "Director"))
            .await
            .unwrap();
        assert_eq!(policy.total_approvers(), 4);

        let err = h
            .workflow
            .add_approver(h.company_id, PolicyApprover::new(director, 5, "Director"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExpenseError::Validation(_)));

        let policy = h.workflow.remove_approver(h.company_id, h.finance).await.unwrap();
        assert_eq!(policy.total_approvers(), 3);
        assert_eq!(h.workflow.get_policy(h.company_id).await.unwrap(), policy);

        // Removing someone outside the chain is a no-op
        let unchanged = h.workflow.remove_approver(h.company_id, UserId::new()).await.unwrap();
        assert_eq!(unchanged, policy);
    }

    #[tokio::test]
    async fn test_approvers_must_belong_to_the_company() {
        let h = Harness::new().await;
        let other_company = CompanyId::new();
        let outsider = UserId::new();
        h.directory
            .add_user(profile(outsider, "Zoe", other_company, None), false)
            .await;

        for user_id in [outsider, UserId::new()] {
            let err = h
                .workflow
                .set_policy(
                    h.company_id,
                    ApprovalRule::Cfo,
                    vec![
                        PolicyApprover::new(h.manager, 1, "Manager"),
                        PolicyApprover::new(user_id, 2, "Finance"),
                    ],
                )
                .await
                .unwrap_err();
            assert!(matches!(err, ExpenseError::Validation(_)));
        }
        assert!(h.workflow.get_policy(h.company_id).await.unwrap_err().is_not_found());

        let h = h.with_policy(percentage(60)).await;
        for user_id in [outsider, UserId::new()] {
            let err = h
                .workflow
                .add_approver(h.company_id, PolicyApprover::new(user_id, 4, "Director"))
                .await
                .unwrap_err();
            assert!(matches!(err, ExpenseError::Validation(_)));
        }
        assert_eq!(h.workflow.get_policy(h.company_id).await.unwrap().total_approvers(), 3);
    }

    #[tokio::test]
    async fn test_ratio_rule_requires_approvers() {
        let h = Harness::new().await;
        let err = h
            .workflow
            .set_policy(h.company_id, percentage(60), vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, ExpenseError::Validation(_)));
    }
}

// ============================================================================
// Queries
// ============================================================================

mod query_tests {
    use super::*;

    #[tokio::test]
    async fn test_listing_and_summary() {
        let h = Harness::new().await.with_policy(percentage(100)).await;
        let first = h.submit().await;
        let second = h.submit().await;
        let third = h.submit().await;

        h.workflow.approve(second.id, &approver(h.manager), None).await.unwrap();
        h.workflow.reject(third.id, &approver(h.manager), None).await.unwrap();

        let mine = h.workflow.claims_for_claimant(h.claimant).await.unwrap();
        assert_eq!(mine.len(), 3);

        let for_manager = h.workflow.pending_for_approver(h.manager).await.unwrap();
        assert_eq!(for_manager.iter().map(|c| c.id).collect::<Vec<_>>(), vec![first.id]);

        let for_finance = h.workflow.pending_for_approver(h.finance).await.unwrap();
        assert_eq!(for_finance.iter().map(|c| c.id).collect::<Vec<_>>(), vec![second.id]);

        assert_eq!(h.workflow.open_claims(h.company_id).await.unwrap().len(), 2);
        assert_eq!(h.workflow.company_claims(h.company_id).await.unwrap().len(), 3);

        let summary = h.workflow.summary(h.company_id, None).await.unwrap();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.pending, 1);
        assert_eq!(summary.in_review, 1);
        assert_eq!(summary.approved, 0);
        assert_eq!(summary.rejected, 1);
        assert_eq!(summary.open_amount, Money::new(dec!(19920.00), Currency::INR));
        assert!(summary.approved_amount.is_zero());

        let theirs = h.workflow.summary(h.company_id, Some(UserId::new())).await.unwrap();
        assert_eq!(theirs.total, 0);
    }
}
