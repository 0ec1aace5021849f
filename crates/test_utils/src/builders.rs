//! Test Data Builders
//!
//! Builders that let tests specify only the relevant fields while using
//! defaults for everything else, plus a seeded in-memory company.

use std::sync::Arc;

use chrono::NaiveDate;
use core_kernel::{CompanyId, Currency, Money, UserId};
use domain_expense::adapters::memory::{
    InMemoryClaimRepository, InMemoryDirectory, InMemoryPolicyRepository,
};
use domain_expense::{
    ApprovalPolicy, ApprovalRule, Approver, ClaimWorkflow, ExpenseCategory, ExpenseClaim,
    ExpenseError, PolicyApprover, SubmitClaim,
};

use crate::fixtures::{DateFixtures, MoneyFixtures, ProfileFixtures};

/// Builder for submission requests
pub struct SubmitClaimBuilder {
    claimant_id: UserId,
    company_id: CompanyId,
    amount: Money,
    category: ExpenseCategory,
    description: String,
    merchant: Option<String>,
    expense_date: NaiveDate,
    receipt_ref: Option<String>,
}

impl SubmitClaimBuilder {
    pub fn new(claimant_id: UserId, company_id: CompanyId) -> Self {
        Self {
            claimant_id,
            company_id,
            amount: MoneyFixtures::usd_120(),
            category: ExpenseCategory::Travel,
            description: "Client visit train fare".to_string(),
            merchant: None,
            expense_date: DateFixtures::expense_date(),
            receipt_ref: None,
        }
    }

    pub fn with_amount(mut self, amount: Money) -> Self {
        self.amount = amount;
        self
    }

    pub fn with_category(mut self, category: ExpenseCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_merchant(mut self, merchant: impl Into<String>) -> Self {
        self.merchant = Some(merchant.into());
        self
    }

    pub fn build(self) -> SubmitClaim {
        SubmitClaim {
            claimant_id: self.claimant_id,
            company_id: self.company_id,
            amount: self.amount,
            category: self.category,
            description: self.description,
            merchant: self.merchant,
            expense_date: self.expense_date,
            receipt_ref: self.receipt_ref,
        }
    }
}

/// Builder for approval policies
pub struct PolicyBuilder {
    company_id: CompanyId,
    rule: ApprovalRule,
    approvers: Vec<PolicyApprover>,
}

impl PolicyBuilder {
    pub fn new(company_id: CompanyId, rule: ApprovalRule) -> Self {
        Self {
            company_id,
            rule,
            approvers: Vec::new(),
        }
    }

    /// Appends an approver at `level`
    pub fn approver(mut self, user_id: UserId, level: u32, role: &str) -> Self {
        self.approvers.push(PolicyApprover::new(user_id, level, role));
        self
    }

    /// Appends a CFO-flagged approver at `level`
    pub fn cfo(mut self, user_id: UserId, level: u32) -> Self {
        self.approvers.push(PolicyApprover::new(user_id, level, "CFO").cfo());
        self
    }

    pub fn approvers(&self) -> Vec<PolicyApprover> {
        self.approvers.clone()
    }

    pub fn build(self) -> Result<ApprovalPolicy, ExpenseError> {
        ApprovalPolicy::new(self.company_id, self.rule, self.approvers)
    }
}

/// An in-memory company: a claimant reporting to a manager, a finance
/// approver, a CFO and an admin, all wired to a workflow
pub struct TestCompany {
    pub workflow: ClaimWorkflow,
    pub claims: Arc<InMemoryClaimRepository>,
    pub directory: Arc<InMemoryDirectory>,
    pub company_id: CompanyId,
    pub currency: Currency,
    pub claimant: UserId,
    pub manager: UserId,
    pub finance: UserId,
    pub cfo: UserId,
    pub admin: UserId,
}

impl TestCompany {
    /// Seeds a company reporting in `currency`
    pub async fn new(currency: Currency) -> Self {
        let company_id = CompanyId::new();
        let (claimant, manager, finance, cfo, admin) =
            (UserId::new(), UserId::new(), UserId::new(), UserId::new(), UserId::new());

        let directory = Arc::new(InMemoryDirectory::new());
        directory.add_company(company_id, currency).await;
        for (user_id, name, manager_id, is_admin) in [
            (claimant, "Ana", Some(manager), false),
            (manager, "Raj", None, false),
            (finance, "Li", None, false),
            (cfo, "Sam", None, false),
            (admin, "Mei", None, true),
        ] {
            directory
                .add_user(ProfileFixtures::profile(user_id, name, company_id, manager_id), is_admin)
                .await;
        }

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
            currency,
            claimant,
            manager,
            finance,
            cfo,
            admin,
        }
    }

    /// Installs `rule` over the standard chain: manager, finance, CFO
    pub async fn with_standard_chain(self, rule: ApprovalRule) -> Result<Self, ExpenseError> {
        let approvers = PolicyBuilder::new(self.company_id, rule)
            .approver(self.manager, 1, "Manager")
            .approver(self.finance, 2, "Finance")
            .cfo(self.cfo, 3)
            .approvers();
        self.workflow
            .set_policy(self.company_id, rule, approvers)
            .await?;
        Ok(self)
    }

    pub fn submission(&self) -> SubmitClaimBuilder {
        SubmitClaimBuilder::new(self.claimant, self.company_id)
    }

    /// Submits the default claim
    pub async fn submit(&self) -> Result<ExpenseClaim, ExpenseError> {
        self.workflow.submit(self.submission().build()).await
    }

    /// The acting identity for one of the seeded users
    pub fn approver(&self, user_id: UserId) -> Approver {
        let name = match user_id {
            id if id == self.manager => "Raj",
            id if id == self.finance => "Li",
            id if id == self.cfo => "Sam",
            id if id == self.admin => "Mei",
            _ => "Ana",
        };
        Approver::new(user_id, name)
    }

    /// Approves as `user_id` without a comment
    pub async fn approve_as(
        &self,
        claim: &ExpenseClaim,
        user_id: UserId,
    ) -> Result<ExpenseClaim, ExpenseError> {
        self.workflow
            .approve(claim.id, &self.approver(user_id), None)
            .await
    }
}
