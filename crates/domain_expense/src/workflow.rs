//! Claim approval workflow
//!
//! `ClaimWorkflow` is the only component that changes a claim. Each command
//! reads the claim, applies the transition to a local copy, and writes it
//! back with a version check, so two concurrent commands on one claim can
//! never both succeed against the same version.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use core_kernel::{
    ClaimId, CompanyId, CurrencyConverter, FixedRateConverter, HealthCheckResult, Money, PortError,
    UserId,
};

use crate::chain::{ApprovalChainResolver, ChainPosition};
use crate::claim::{ClaimStatus, ExpenseClaim, SubmitClaim};
use crate::error::ExpenseError;
use crate::evaluator::{ApprovalTally, AutoApprovalEvaluator};
use crate::ledger::AuditEntry;
use crate::policy::{ApprovalPolicy, ApprovalRule, PolicyApprover};
use crate::ports::{ClaimQuery, ClaimRepository, DirectoryPort, PolicyRepository};

const SUBMITTED_COMMENT: &str = "Expense submitted for approval";
const DEFAULT_APPROVE_COMMENT: &str = "Approved";
const DEFAULT_REJECT_COMMENT: &str = "Rejected";
const OVERRIDE_REASON: &str = "Administrative override";
const CHAIN_COMPLETED_REASON: &str = "Approval chain completed";

/// Limits applied to repository calls
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Upper bound for a single repository call
    pub repository_timeout: Duration,
    /// Extra attempts for reads that fail with `RepositoryUnavailable`
    pub read_retries: u32,
}

impl WorkflowConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn repository_timeout(mut self, timeout: Duration) -> Self {
        self.repository_timeout = timeout;
        self
    }

    pub fn read_retries(mut self, retries: u32) -> Self {
        self.read_retries = retries;
        self
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            repository_timeout: Duration::from_secs(5),
            read_retries: 2,
        }
    }
}

/// The person acting on a claim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Approver {
    pub id: UserId,
    pub display_name: String,
}

impl Approver {
    pub fn new(id: UserId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
        }
    }
}

/// Counts and totals over a set of claims, in the company's currency
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimSummary {
    pub total: usize,
    pub pending: usize,
    pub in_review: usize,
    pub approved: usize,
    pub rejected: usize,
    pub approved_amount: Money,
    /// Sum over `Pending` and `InReview` claims
    pub open_amount: Money,
}

/// Orchestrates claim submission and approver actions
pub struct ClaimWorkflow {
    claims: Arc<dyn ClaimRepository>,
    policies: Arc<dyn PolicyRepository>,
    directory: Arc<dyn DirectoryPort>,
    converter: Arc<dyn CurrencyConverter>,
    config: WorkflowConfig,
}

impl ClaimWorkflow {
    /// Creates a workflow with the fixed-rate converter and default limits
    pub fn new(
        claims: Arc<dyn ClaimRepository>,
        policies: Arc<dyn PolicyRepository>,
        directory: Arc<dyn DirectoryPort>,
    ) -> Self {
        Self {
            claims,
            policies,
            directory,
            converter: Arc::new(FixedRateConverter::default()),
            config: WorkflowConfig::default(),
        }
    }

    pub fn with_converter(mut self, converter: Arc<dyn CurrencyConverter>) -> Self {
        self.converter = converter;
        self
    }

    pub fn with_config(mut self, config: WorkflowConfig) -> Self {
        self.config = config;
        self
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Submits a new claim
    ///
    /// The claim starts `Pending` at level 1, assigned to the claimant's
    /// manager, or to a company admin when the claimant has no manager.
    #[instrument(skip(self, request), fields(claimant_id = %request.claimant_id))]
    pub async fn submit(&self, request: SubmitClaim) -> Result<ExpenseClaim, ExpenseError> {
        request.validate()?;
        let claimant_id = request.claimant_id;
        let company_id = request.company_id;

        let claimant = self
            .read("get_claimant", || self.directory.claimant(claimant_id))
            .await?
            .ok_or_else(|| ExpenseError::not_found("User", claimant_id))?;
        if claimant.company_id != company_id {
            return Err(ExpenseError::validation(format!(
                "user {claimant_id} does not belong to company {company_id}"
            )));
        }

        let currency = self
            .read("get_company_currency", || self.directory.company_currency(company_id))
            .await?
            .ok_or_else(|| ExpenseError::not_found("Company", company_id))?;
        let converted = self.converter.convert(&request.amount, currency)?;

        let first_approver = match claimant.manager_id {
            Some(manager) => Some(manager),
            None => {
                self.read("get_company_admin", || self.directory.company_admin(company_id))
                    .await?
            }
        };
        if first_approver.is_none() {
            warn!("claimant has no manager and the company has no admin; claim is unassigned");
        }

        let entry = AuditEntry::submitted(claimant.user_id, claimant.display_name, SUBMITTED_COMMENT);
        let claim = ExpenseClaim::submit(request, converted, first_approver, entry);
        self.bounded("insert_claim", self.claims.insert(&claim)).await?;

        info!(
            claim_id = %claim.id,
            amount = %claim.amount,
            converted = %claim.converted_amount,
            "claim submitted"
        );
        Ok(claim)
    }

    /// Records an approval and applies the company's policy
    ///
    /// If the policy is satisfied the claim is finalized as `Approved`;
    /// otherwise it moves to the next level of the chain. Past the deepest
    /// configured level the chain is complete and the claim is approved.
    #[instrument(skip(self, approver, comment), fields(claim_id = %claim_id, approver = %approver.id))]
    pub async fn approve(
        &self,
        claim_id: ClaimId,
        approver: &Approver,
        comment: Option<&str>,
    ) -> Result<ExpenseClaim, ExpenseError> {
        let mut claim = self.load_open(claim_id).await?;
        if claim.current_approver_id() != Some(approver.id) {
            debug!(current = ?claim.current_approver_id(), "approval from outside the current level");
        }
        claim.record(AuditEntry::approved(
            approver.id,
            approver.display_name.clone(),
            comment_or(comment, DEFAULT_APPROVE_COMMENT),
        ));

        let company_id = claim.company_id;
        let policy = self
            .read("get_policy", || self.policies.get(company_id))
            .await?;
        let tally = ApprovalTally::from_history(policy.as_ref(), claim.history());
        let evaluation = AutoApprovalEvaluator::evaluate(policy.as_ref(), claim.history(), tally)?;

        if evaluation.auto_approve {
            claim.record(AuditEntry::system_approval(approver.id, evaluation.reason.to_string()));
            claim.finalize_approved();
            info!(reason = %evaluation.reason, "claim auto-approved");
            return self.commit(claim).await;
        }

        let next_level = claim.current_level() + 1;
        match ApprovalChainResolver::position(policy.as_ref(), next_level) {
            ChainPosition::Assigned(next) => {
                claim.advance(next_level, Some(next));
                info!(level = next_level, next_approver = %next, "claim moved to next level");
            }
            ChainPosition::Vacant => {
                claim.advance(next_level, None);
                warn!(level = next_level, "no approver configured at level; claim is unassigned");
            }
            ChainPosition::Exhausted => {
                claim.advance(next_level, None);
                claim.record(AuditEntry::system_approval(approver.id, CHAIN_COMPLETED_REASON));
                claim.finalize_approved();
                info!(level = next_level, "approval chain completed; claim approved");
            }
        }
        self.commit(claim).await
    }

    /// Finalizes a claim as `Approved` without evaluating the policy
    ///
    /// The caller is responsible for checking that the approver holds the
    /// override capability.
    #[instrument(skip(self, approver, comment), fields(claim_id = %claim_id, approver = %approver.id))]
    pub async fn force_approve(
        &self,
        claim_id: ClaimId,
        approver: &Approver,
        comment: Option<&str>,
    ) -> Result<ExpenseClaim, ExpenseError> {
        let mut claim = self.load_open(claim_id).await?;
        claim.record(AuditEntry::approved(
            approver.id,
            approver.display_name.clone(),
            comment_or(comment, DEFAULT_APPROVE_COMMENT),
        ));
        claim.record(AuditEntry::system_approval(approver.id, OVERRIDE_REASON));
        claim.finalize_approved();

        info!("claim approved by administrative override");
        self.commit(claim).await
    }

    /// Rejects a claim; rejection never consults the policy
    #[instrument(skip(self, approver, comment), fields(claim_id = %claim_id, approver = %approver.id))]
    pub async fn reject(
        &self,
        claim_id: ClaimId,
        approver: &Approver,
        comment: Option<&str>,
    ) -> Result<ExpenseClaim, ExpenseError> {
        let mut claim = self.load_open(claim_id).await?;
        claim.record(AuditEntry::rejected(
            approver.id,
            approver.display_name.clone(),
            comment_or(comment, DEFAULT_REJECT_COMMENT),
        ));
        claim.finalize_rejected();

        info!(claimant_id = %claim.claimant_id, "claim rejected");
        self.commit(claim).await
    }

    // ========================================================================
    // Policy administration
    // ========================================================================

    pub async fn get_policy(&self, company_id: CompanyId) -> Result<ApprovalPolicy, ExpenseError> {
        self.read("get_policy", || self.policies.get(company_id))
            .await?
            .ok_or_else(|| ExpenseError::not_found("Approval policy", company_id))
    }

    /// Creates or replaces a company's policy
    ///
    /// Every approver must be a user of the same company.
    #[instrument(skip(self, approvers), fields(company_id = %company_id, rule = ?rule.rule_type()))]
    pub async fn set_policy(
        &self,
        company_id: CompanyId,
        rule: ApprovalRule,
        approvers: Vec<PolicyApprover>,
    ) -> Result<ApprovalPolicy, ExpenseError> {
        let policy = ApprovalPolicy::new(company_id, rule, approvers)?;
        for approver in policy.approvers() {
            self.ensure_member(company_id, approver.user_id).await?;
        }
        self.bounded("put_policy", self.policies.put(&policy)).await?;
        info!(approvers = policy.total_approvers(), "approval policy saved");
        Ok(policy)
    }

    /// Adds one approver, who must be a user of the same company, to an
    /// existing policy
    #[instrument(skip(self, approver), fields(company_id = %company_id, user_id = %approver.user_id))]
    pub async fn add_approver(
        &self,
        company_id: CompanyId,
        approver: PolicyApprover,
    ) -> Result<ApprovalPolicy, ExpenseError> {
        let mut policy = self.get_policy(company_id).await?;
        self.ensure_member(company_id, approver.user_id).await?;
        policy.add_approver(approver)?;
        self.bounded("put_policy", self.policies.put(&policy)).await?;
        Ok(policy)
    }

    /// Removes a user from a policy's chain
    ///
    /// Removing a user who is not in the chain leaves the policy unchanged.
    #[instrument(skip(self), fields(company_id = %company_id, user_id = %user_id))]
    pub async fn remove_approver(
        &self,
        company_id: CompanyId,
        user_id: UserId,
    ) -> Result<ApprovalPolicy, ExpenseError> {
        let mut policy = self.get_policy(company_id).await?;
        if policy.remove_approver(user_id)? {
            self.bounded("put_policy", self.policies.put(&policy)).await?;
        } else {
            debug!("user is not in the approver chain");
        }
        Ok(policy)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub async fn get_claim(&self, claim_id: ClaimId) -> Result<ExpenseClaim, ExpenseError> {
        self.read("get_claim", || self.claims.get(claim_id))
            .await?
            .ok_or_else(|| ExpenseError::not_found("Claim", claim_id))
    }

    /// Claims matching a query, newest first
    pub async fn find_claims(&self, query: ClaimQuery) -> Result<Vec<ExpenseClaim>, ExpenseError> {
        self.read("find_claims", || self.claims.find(&query)).await
    }

    pub async fn claims_for_claimant(&self, claimant_id: UserId) -> Result<Vec<ExpenseClaim>, ExpenseError> {
        self.find_claims(ClaimQuery::by_claimant(claimant_id)).await
    }

    /// Open claims whose current approver is `approver_id`
    pub async fn pending_for_approver(&self, approver_id: UserId) -> Result<Vec<ExpenseClaim>, ExpenseError> {
        self.find_claims(ClaimQuery::awaiting(approver_id)).await
    }

    /// Every open claim of a company
    pub async fn open_claims(&self, company_id: CompanyId) -> Result<Vec<ExpenseClaim>, ExpenseError> {
        self.find_claims(ClaimQuery::by_company(company_id).open_only()).await
    }

    pub async fn company_claims(&self, company_id: CompanyId) -> Result<Vec<ExpenseClaim>, ExpenseError> {
        self.find_claims(ClaimQuery::by_company(company_id)).await
    }

    /// Summarizes a company's claims, optionally for one claimant
    pub async fn summary(
        &self,
        company_id: CompanyId,
        claimant_id: Option<UserId>,
    ) -> Result<ClaimSummary, ExpenseError> {
        let currency = self
            .read("get_company_currency", || self.directory.company_currency(company_id))
            .await?
            .ok_or_else(|| ExpenseError::not_found("Company", company_id))?;

        let query = ClaimQuery {
            claimant_id,
            ..ClaimQuery::by_company(company_id)
        };
        let claims = self.find_claims(query).await?;

        let count = |status: ClaimStatus| claims.iter().filter(|c| c.status() == status).count();
        let approved_amount = Money::sum(
            currency,
            claims
                .iter()
                .filter(|c| c.status() == ClaimStatus::Approved)
                .map(|c| &c.converted_amount),
        )?;
        let open_amount = Money::sum(
            currency,
            claims
                .iter()
                .filter(|c| c.status().is_open())
                .map(|c| &c.converted_amount),
        )?;

        Ok(ClaimSummary {
            total: claims.len(),
            pending: count(ClaimStatus::Pending),
            in_review: count(ClaimStatus::InReview),
            approved: count(ClaimStatus::Approved),
            rejected: count(ClaimStatus::Rejected),
            approved_amount,
            open_amount,
        })
    }

    /// Health of the claim and policy repositories
    pub async fn health(&self) -> Vec<HealthCheckResult> {
        vec![
            self.claims.health_check().await,
            self.policies.health_check().await,
        ]
    }

    // ========================================================================
    // Repository access
    // ========================================================================

    async fn load_open(&self, claim_id: ClaimId) -> Result<ExpenseClaim, ExpenseError> {
        let claim = self.get_claim(claim_id).await?;
        claim.ensure_open()?;
        Ok(claim)
    }

    /// Fails unless `user_id` is a directory user of `company_id`
    async fn ensure_member(&self, company_id: CompanyId, user_id: UserId) -> Result<(), ExpenseError> {
        match self.read("get_user", || self.directory.claimant(user_id)).await? {
            Some(profile) if profile.company_id == company_id => Ok(()),
            Some(_) => Err(ExpenseError::validation(format!(
                "approver {user_id} belongs to another company"
            ))),
            None => Err(ExpenseError::validation(format!("approver {user_id} does not exist"))),
        }
    }

    /// Writes the transitioned claim if nobody else changed it meanwhile
    async fn commit(&self, mut claim: ExpenseClaim) -> Result<ExpenseClaim, ExpenseError> {
        let expected = claim.next_version();
        match self.bounded("replace_claim", self.claims.replace(&claim, expected)).await {
            Ok(()) => Ok(claim),
            Err(ExpenseError::Repository(err)) if err.is_conflict() => {
                warn!(claim_id = %claim.id, expected_version = expected, "concurrent modification detected");
                Err(ExpenseError::ConcurrentModification { claim_id: claim.id })
            }
            Err(err) => Err(err),
        }
    }

    /// Runs a read, retrying while the repository is unavailable
    async fn read<T, F, Fut>(&self, operation: &'static str, mut call: F) -> Result<T, ExpenseError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, PortError>>,
    {
        let mut attempt = 0;
        loop {
            match self.bounded(operation, call()).await {
                Err(err) if err.is_retryable() && attempt < self.config.read_retries => {
                    attempt += 1;
                    warn!(operation, attempt, error = %err, "repository read failed; retrying");
                }
                result => return result,
            }
        }
    }

    /// Runs a repository call under the configured timeout
    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, PortError>>,
    ) -> Result<T, ExpenseError> {
        match tokio::time::timeout(self.config.repository_timeout, call).await {
            Ok(result) => result.map_err(ExpenseError::from),
            Err(_) => Err(ExpenseError::RepositoryUnavailable(format!(
                "{operation} timed out after {}ms",
                self.config.repository_timeout.as_millis()
            ))),
        }
    }
}

fn comment_or(comment: Option<&str>, default: &str) -> String {
    comment
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(default)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    use async_trait::async_trait;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    use core_kernel::{Currency, DomainPort, HealthCheckable};
    use crate::adapters::memory::{InMemoryClaimRepository, InMemoryDirectory, InMemoryPolicyRepository};
    use crate::claim::ExpenseCategory;
    use crate::ports::ClaimantProfile;

    /// Lets a competing approval land between our read and our write
    struct RacingRepository {
        inner: InMemoryClaimRepository,
        raced: AtomicBool,
    }

    /// Fails or stalls reads to exercise retry and timeout handling
    struct UnreliableRepository {
        inner: InMemoryClaimRepository,
        failures_left: AtomicU32,
        stall: Option<Duration>,
        reads: AtomicU32,
    }

    impl DomainPort for RacingRepository {}
    impl DomainPort for UnreliableRepository {}

    #[async_trait]
    impl HealthCheckable for RacingRepository {
        async fn health_check(&self) -> HealthCheckResult {
            self.inner.health_check().await
        }
    }

    #[async_trait]
    impl HealthCheckable for UnreliableRepository {
        async fn health_check(&self) -> HealthCheckResult {
            self.inner.health_check().await
        }
    }

    #[async_trait]
    impl ClaimRepository for RacingRepository {
        async fn get(&self, id: ClaimId) -> Result<Option<ExpenseClaim>, PortError> {
            let snapshot = self.inner.get(id).await?;
            if let Some(claim) = &snapshot {
                if !self.raced.swap(true, Ordering::SeqCst) {
                    let mut competitor = claim.clone();
                    competitor.record(AuditEntry::approved(UserId::new(), "Competitor", "Approved"));
                    competitor.advance(claim.current_level() + 1, None);
                    let expected = competitor.next_version();
                    self.inner.replace(&competitor, expected).await?;
                }
            }
            Ok(snapshot)
        }

        async fn find(&self, query: &ClaimQuery) -> Result<Vec<ExpenseClaim>, PortError> {
            self.inner.find(query).await
        }

        async fn insert(&self, claim: &ExpenseClaim) -> Result<(), PortError> {
            self.inner.insert(claim).await
        }

        async fn replace(&self, claim: &ExpenseClaim, expected_version: u64) -> Result<(), PortError> {
            self.inner.replace(claim, expected_version).await
        }
    }

    #[async_trait]
    impl ClaimRepository for UnreliableRepository {
        async fn get(&self, id: ClaimId) -> Result<Option<ExpenseClaim>, PortError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            if let Some(stall) = self.stall {
                tokio::time::sleep(stall).await;
            }
            let left = self.failures_left.load(Ordering::SeqCst);
            if left > 0 {
                self.failures_left.store(left - 1, Ordering::SeqCst);
                return Err(PortError::connection("connection reset"));
            }
            self.inner.get(id).await
        }

        async fn find(&self, query: &ClaimQuery) -> Result<Vec<ExpenseClaim>, PortError> {
            self.inner.find(query).await
        }

        async fn insert(&self, claim: &ExpenseClaim) -> Result<(), PortError> {
            self.inner.insert(claim).await
        }

        async fn replace(&self, claim: &ExpenseClaim, expected_version: u64) -> Result<(), PortError> {
            self.inner.replace(claim, expected_version).await
        }
    }

    async fn directory(company_id: CompanyId, claimant: UserId, manager: UserId) -> Arc<InMemoryDirectory> {
        let directory = InMemoryDirectory::new();
        directory.add_company(company_id, Currency::USD).await;
        directory
            .add_user(
                ClaimantProfile {
                    user_id: claimant,
                    display_name: "Ana".to_string(),
                    company_id,
                    manager_id: Some(manager),
                },
                false,
            )
            .await;
        Arc::new(directory)
    }

    fn request(company_id: CompanyId, claimant: UserId) -> SubmitClaim {
        SubmitClaim {
            claimant_id: claimant,
            company_id,
            amount: Money::new(dec!(75.00), Currency::USD),
            category: ExpenseCategory::Transportation,
            description: "Airport taxi".to_string(),
            merchant: Some("Uber".to_string()),
            expense_date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            receipt_ref: None,
        }
    }

    async fn three_level_policy(policies: &InMemoryPolicyRepository, company_id: CompanyId) {
        let approvers = (1..=3)
            .map(|level| PolicyApprover::new(UserId::new(), level, "Approver"))
            .collect();
        let policy = ApprovalPolicy::new(
            company_id,
            ApprovalRule::Percentage { threshold: crate::policy::Threshold::new(100).unwrap() },
            approvers,
        )
        .unwrap();
        policies.put(&policy).await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_approval_is_detected_not_lost() {
        let company_id = CompanyId::new();
        let (claimant, manager) = (UserId::new(), UserId::new());
        let claims = Arc::new(RacingRepository {
            inner: InMemoryClaimRepository::new(),
            raced: AtomicBool::new(true),
        });
        let policies = Arc::new(InMemoryPolicyRepository::new());
        three_level_policy(&policies, company_id).await;
        let workflow = ClaimWorkflow::new(
            claims.clone(),
            policies,
            directory(company_id, claimant, manager).await,
        );

        let claim = workflow.submit(request(company_id, claimant)).await.unwrap();
        claims.raced.store(false, Ordering::SeqCst);

        let approver = Approver::new(manager, "Raj");
        let err = workflow.approve(claim.id, &approver, None).await.unwrap_err();
        assert!(matches!(err, ExpenseError::ConcurrentModification { claim_id } if claim_id == claim.id));

        // Only the competitor's approval was stored
        let stored = claims.inner.get(claim.id).await.unwrap().unwrap();
        assert_eq!(stored.history().approval_count(), 1);
        assert_eq!(stored.version(), 2);

        // Re-running the command on fresh state keeps both approvals
        let retried = workflow.approve(claim.id, &approver, None).await.unwrap();
        assert_eq!(retried.history().approval_count(), 2);
        assert_eq!(retried.current_level(), 3);
        assert_eq!(retried.version(), 3);
    }

    #[tokio::test]
    async fn test_transient_read_failures_are_retried() {
        let company_id = CompanyId::new();
        let (claimant, manager) = (UserId::new(), UserId::new());
        let claims = Arc::new(UnreliableRepository {
            inner: InMemoryClaimRepository::new(),
            failures_left: AtomicU32::new(0),
            stall: None,
            reads: AtomicU32::new(0),
        });
        let workflow = ClaimWorkflow::new(
            claims.clone(),
            Arc::new(InMemoryPolicyRepository::new()),
            directory(company_id, claimant, manager).await,
        );
        let claim = workflow.submit(request(company_id, claimant)).await.unwrap();

        claims.failures_left.store(2, Ordering::SeqCst);
        let fetched = workflow.get_claim(claim.id).await.unwrap();
        assert_eq!(fetched.id, claim.id);
        assert_eq!(claims.reads.load(Ordering::SeqCst), 3);

        claims.failures_left.store(5, Ordering::SeqCst);
        let err = workflow.get_claim(claim.id).await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_slow_repository_surfaces_as_unavailable() {
        let company_id = CompanyId::new();
        let (claimant, manager) = (UserId::new(), UserId::new());
        let claims = Arc::new(UnreliableRepository {
            inner: InMemoryClaimRepository::new(),
            failures_left: AtomicU32::new(0),
            stall: Some(Duration::from_millis(200)),
            reads: AtomicU32::new(0),
        });
        let workflow = ClaimWorkflow::new(
            claims.clone(),
            Arc::new(InMemoryPolicyRepository::new()),
            directory(company_id, claimant, manager).await,
        )
        .with_config(
            WorkflowConfig::new()
                .repository_timeout(Duration::from_millis(20))
                .read_retries(1),
        );
        let claim = workflow.submit(request(company_id, claimant)).await.unwrap();

        let err = workflow
            .reject(claim.id, &Approver::new(manager, "Raj"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ExpenseError::RepositoryUnavailable(_)));
        assert_eq!(claims.reads.load(Ordering::SeqCst), 2);

        let stored = claims.inner.get(claim.id).await.unwrap().unwrap();
        assert_eq!(stored.status(), ClaimStatus::Pending);
    }

    #[tokio::test]
    async fn test_oversized_amount_is_refused_before_conversion() {
        let company_id = CompanyId::new();
        let (claimant, manager) = (UserId::new(), UserId::new());
        let claims = Arc::new(InMemoryClaimRepository::new());
        let workflow = ClaimWorkflow::new(
            claims.clone(),
            Arc::new(InMemoryPolicyRepository::new()),
            directory(company_id, claimant, manager).await,
        );

        let mut oversized = request(company_id, claimant);
        oversized.amount = Money::new(dec!(1000000000000000000000000000), Currency::USD);
        let err = workflow.submit(oversized).await.unwrap_err();
        assert!(matches!(err, ExpenseError::Validation(_)));
        assert!(claims.is_empty().await);
    }

    #[tokio::test]
    async fn test_summary_overflow_is_an_error() {
        let company_id = CompanyId::new();
        let (claimant, manager) = (UserId::new(), UserId::new());
        let claims = Arc::new(InMemoryClaimRepository::new());
        for _ in 0..2 {
            let mut req = request(company_id, claimant);
            req.amount = Money::new(dec!(50000000000000000000000000000), Currency::USD);
            let entry = AuditEntry::submitted(claimant, "Ana", SUBMITTED_COMMENT);
            let converted = req.amount;
            claims
                .insert(&ExpenseClaim::submit(req, converted, Some(manager), entry))
                .await
                .unwrap();
        }
        let workflow = ClaimWorkflow::new(
            claims,
            Arc::new(InMemoryPolicyRepository::new()),
            directory(company_id, claimant, manager).await,
        );

        let err = workflow.summary(company_id, None).await.unwrap_err();
        assert!(matches!(err, ExpenseError::Currency(core_kernel::MoneyError::Overflow(_))));
    }

    #[test]
    fn test_comment_defaults() {
        assert_eq!(comment_or(None, "Rejected"), "Rejected");
        assert_eq!(comment_or(Some("  "), "Rejected"), "Rejected");
        assert_eq!(comment_or(Some(" receipts missing "), "Rejected"), "receipts missing");
    }
}
