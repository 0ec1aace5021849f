//! Approval rule handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use validator::Validate;

use core_kernel::UserId;
use domain_expense::{ApprovalRule, PolicyApprover};

use crate::auth::{require_role, roles, Claims};
use crate::dto::rules::*;
use crate::{error::ApiError, AppState};

/// The caller's company rule
pub async fn get_rules(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<RuleResponse>, ApiError> {
    require_role(&claims, roles::MANAGER)?;
    let policy = state.workflow.get_policy(claims.company()?).await?;
    Ok(Json(RuleResponse::from(&policy)))
}

/// Creates or replaces the company rule
pub async fn update_rules(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<UpdateRuleRequest>,
) -> Result<Json<RuleResponse>, ApiError> {
    require_role(&claims, roles::ADMIN)?;
    request.validate()?;
    let company_id = claims.company()?;

    let rule = ApprovalRule::from_parts(request.rule_type, request.threshold)?;
    let approvers: Vec<PolicyApprover> = match request.approvers {
        Some(approvers) => approvers.into_iter().map(PolicyApprover::from).collect(),
        None => match state.workflow.get_policy(company_id).await {
            Ok(existing) => existing.approvers().to_vec(),
            Err(e) if e.is_not_found() => Vec::new(),
            Err(e) => return Err(e.into()),
        },
    };

    let policy = state.workflow.set_policy(company_id, rule, approvers).await?;
    Ok(Json(RuleResponse::from(&policy)))
}

/// Adds one approver to the chain
pub async fn add_approver(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<ApproverRequest>,
) -> Result<(StatusCode, Json<RuleResponse>), ApiError> {
    require_role(&claims, roles::ADMIN)?;
    request.validate()?;

    let policy = state
        .workflow
        .add_approver(claims.company()?, request.into())
        .await?;
    Ok((StatusCode::CREATED, Json(RuleResponse::from(&policy))))
}

/// Removes a user from the chain
pub async fn remove_approver(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<UserId>,
) -> Result<Json<RuleResponse>, ApiError> {
    require_role(&claims, roles::ADMIN)?;

    let policy = state
        .workflow
        .remove_approver(claims.company()?, user_id)
        .await?;
    Ok(Json(RuleResponse::from(&policy)))
}
