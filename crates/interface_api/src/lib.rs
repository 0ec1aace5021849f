//! HTTP API Layer
//!
//! REST API for the expense approval system, built on Axum.
//!
//! # Architecture
//!
//! - **Handlers**: expense claims, approval rules, health
//! - **Middleware**: JWT authentication and request logging
//! - **DTOs**: request/response bodies, validated with `validator`
//! - **Error Handling**: `ExpenseError` mapped onto HTTP status codes
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::create_router;
//!
//! let app = create_router(Arc::new(workflow), config);
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;
pub mod auth;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use domain_expense::ClaimWorkflow;

use crate::config::ApiConfig;
use crate::handlers::{expenses, health, rules};
use crate::middleware::{audit_middleware, auth_middleware};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub workflow: Arc<ClaimWorkflow>,
    pub config: ApiConfig,
}

/// Creates the main API router
pub fn create_router(workflow: Arc<ClaimWorkflow>, config: ApiConfig) -> Router {
    let state = AppState { workflow, config };

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let expense_routes = Router::new()
        .route("/", post(expenses::submit_expense).get(expenses::list_expenses))
        .route("/mine", get(expenses::my_expenses))
        .route("/pending", get(expenses::pending_expenses))
        .route("/summary", get(expenses::expense_summary))
        .route("/:id", get(expenses::get_expense))
        .route("/:id/approve", put(expenses::approve_expense))
        .route("/:id/reject", put(expenses::reject_expense));

    let rule_routes = Router::new()
        .route("/", get(rules::get_rules).put(rules::update_rules))
        .route("/approvers", post(rules::add_approver))
        .route("/approvers/:user_id", delete(rules::remove_approver));

    // Protected API routes
    let api_routes = Router::new()
        .nest("/expenses", expense_routes)
        .nest("/rules", rule_routes)
        .layer(axum_middleware::from_fn_with_state(state.clone(), audit_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
