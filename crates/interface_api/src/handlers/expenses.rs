//! Expense claim handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use validator::Validate;

use core_kernel::{ClaimId, Currency, Money};
use domain_expense::{ExpenseClaim, SubmitClaim};

use crate::auth::{require_role, roles, Claims};
use crate::dto::expenses::*;
use crate::{error::ApiError, AppState};

/// Submits a claim on behalf of the caller
pub async fn submit_expense(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<SubmitExpenseRequest>,
) -> Result<(StatusCode, Json<ExpenseResponse>), ApiError> {
    request.validate()?;
    let currency: Currency = request
        .currency
        .parse()
        .map_err(|e: core_kernel::MoneyError| ApiError::validation(e.to_string()))?;

    let claim = state
        .workflow
        .submit(SubmitClaim {
            claimant_id: claims.user_id()?,
            company_id: claims.company()?,
            amount: Money::new(request.amount, currency),
            category: request.category,
            description: request.description,
            merchant: request.merchant,
            expense_date: request.expense_date,
            receipt_ref: request.receipt_ref,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ExpenseResponse::from(&claim))))
}

/// Claims submitted by the caller
pub async fn my_expenses(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<ExpenseResponse>>, ApiError> {
    let found = state.workflow.claims_for_claimant(claims.user_id()?).await?;
    Ok(Json(to_responses(&found)))
}

/// Open claims the caller can act on
///
/// Admins see every open claim of their company; others see the claims
/// currently assigned to them.
pub async fn pending_expenses(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<ExpenseResponse>>, ApiError> {
    require_role(&claims, roles::MANAGER)?;
    let found = if claims.is_admin() {
        state.workflow.open_claims(claims.company()?).await?
    } else {
        state.workflow.pending_for_approver(claims.user_id()?).await?
    };
    Ok(Json(to_responses(&found)))
}

/// Every claim of the caller's company
pub async fn list_expenses(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<ExpenseResponse>>, ApiError> {
    require_role(&claims, roles::ADMIN)?;
    let found = state.workflow.company_claims(claims.company()?).await?;
    Ok(Json(to_responses(&found)))
}

/// Company-wide summary for admins, personal summary for everyone else
pub async fn expense_summary(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let claimant = if claims.is_admin() {
        None
    } else {
        Some(claims.user_id()?)
    };
    let summary = state.workflow.summary(claims.company()?, claimant).await?;
    Ok(Json(summary.into()))
}

/// Claim detail, visible to its claimant, the current approver and admins
pub async fn get_expense(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<ClaimId>,
) -> Result<Json<ExpenseResponse>, ApiError> {
    let claim = load_in_company(&state, &claims, id).await?;

    let user_id = claims.user_id()?;
    let visible = claims.is_admin()
        || claim.claimant_id == user_id
        || claim.current_approver_id() == Some(user_id);
    if !visible {
        return Err(ApiError::Forbidden("not allowed to view this claim".to_string()));
    }

    Ok(Json(ExpenseResponse::from(&claim)))
}

/// Approves a claim; an admin's approval finalizes it
pub async fn approve_expense(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<ClaimId>,
    body: Option<Json<ApprovalActionRequest>>,
) -> Result<Json<ExpenseResponse>, ApiError> {
    require_role(&claims, roles::MANAGER)?;
    let request = action_body(body)?;
    load_in_company(&state, &claims, id).await?;

    let approver = claims.approver()?;
    let comment = request.comment.as_deref();
    let claim = if claims.is_admin() {
        state.workflow.force_approve(id, &approver, comment).await?
    } else {
        state.workflow.approve(id, &approver, comment).await?
    };

    Ok(Json(ExpenseResponse::from(&claim)))
}

/// Rejects a claim
pub async fn reject_expense(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<ClaimId>,
    body: Option<Json<ApprovalActionRequest>>,
) -> Result<Json<ExpenseResponse>, ApiError> {
    require_role(&claims, roles::MANAGER)?;
    let request = action_body(body)?;
    load_in_company(&state, &claims, id).await?;

    let claim = state
        .workflow
        .reject(id, &claims.approver()?, request.comment.as_deref())
        .await?;

    Ok(Json(ExpenseResponse::from(&claim)))
}

/// Loads a claim, hiding claims of other companies
async fn load_in_company(
    state: &AppState,
    claims: &Claims,
    id: ClaimId,
) -> Result<ExpenseClaim, ApiError> {
    let claim = state.workflow.get_claim(id).await?;
    if claim.company_id != claims.company()? {
        return Err(ApiError::NotFound(format!("Claim not found: {id}")));
    }
    Ok(claim)
}

fn action_body(body: Option<Json<ApprovalActionRequest>>) -> Result<ApprovalActionRequest, ApiError> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    request.validate()?;
    Ok(request)
}

fn to_responses(found: &[ExpenseClaim]) -> Vec<ExpenseResponse> {
    found.iter().map(ExpenseResponse::from).collect()
}
