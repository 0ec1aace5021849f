//! Approval rule DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::{CompanyId, UserId};
use domain_expense::{ApprovalPolicy, PolicyApprover, RuleType};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ApproverRequest {
    pub user_id: UserId,
    #[validate(range(min = 1))]
    pub level: u32,
    #[validate(length(min = 1, max = 100))]
    pub role: String,
    #[serde(default)]
    pub is_cfo: bool,
}

impl From<ApproverRequest> for PolicyApprover {
    fn from(request: ApproverRequest) -> Self {
        let approver = PolicyApprover::new(request.user_id, request.level, request.role);
        if request.is_cfo {
            approver.cfo()
        } else {
            approver
        }
    }
}

/// Replaces the company's rule
///
/// Omitting `approvers` keeps the current chain.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRuleRequest {
    pub rule_type: RuleType,
    #[validate(range(min = 1, max = 100))]
    pub threshold: Option<u32>,
    #[validate(nested)]
    pub approvers: Option<Vec<ApproverRequest>>,
}

#[derive(Debug, Serialize)]
pub struct ApproverResponse {
    pub user_id: UserId,
    pub level: u32,
    pub role: String,
    pub is_cfo: bool,
}

#[derive(Debug, Serialize)]
pub struct RuleResponse {
    pub company_id: CompanyId,
    pub rule_type: RuleType,
    pub threshold: Option<u32>,
    pub approvers: Vec<ApproverResponse>,
    pub total_approvers: usize,
    pub updated_at: DateTime<Utc>,
}

impl From<&ApprovalPolicy> for RuleResponse {
    fn from(policy: &ApprovalPolicy) -> Self {
        Self {
            company_id: policy.company_id(),
            rule_type: policy.rule().rule_type(),
            threshold: policy.rule().threshold().map(|t| t.percent()),
            approvers: policy
                .approvers()
                .iter()
                .map(|a| ApproverResponse {
                    user_id: a.user_id,
                    level: a.level,
                    role: a.display_role.clone(),
                    is_cfo: a.is_cfo,
                })
                .collect(),
            total_approvers: policy.total_approvers(),
            updated_at: policy.updated_at(),
        }
    }
}
