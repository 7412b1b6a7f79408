//! HTTP API Layer
//!
//! REST surface of the commission engine: rule catalog administration,
//! commission recording and approval, agent earnings, and the payout
//! lifecycle.
//!
//! # Architecture
//!
//! - **Handlers**: one module per resource
//! - **Middleware**: JWT authentication and request logging
//! - **DTOs**: request/response bodies
//! - **State**: services wired over the in-memory or PostgreSQL ports
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState, Ports};
//!
//! let state = AppState::new(config, Ports::in_memory(false))?;
//! axum::serve(listener, create_router(state)).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;
pub mod auth;
pub mod state;

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{agents, commissions, health, payouts, rules};
use crate::middleware::{auth_middleware, request_log_middleware};

pub use crate::state::{AppState, Ports};

/// Creates the main API router
pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let rule_routes = Router::new()
        .route("/", post(rules::create_rule).get(rules::list_rules))
        .route("/:id", get(rules::get_rule))
        .route("/:id/pricing", put(rules::update_pricing))
        .route("/:id/deactivate", post(rules::deactivate_rule))
        .route("/:id/activate", post(rules::activate_rule));

    let commission_routes = Router::new()
        .route("/", post(commissions::create_commission))
        .route("/:id", get(commissions::get_commission))
        .route("/:id/approve", post(commissions::approve_commission));

    let agent_routes = Router::new()
        .route("/:id/commissions", get(agents::list_commissions))
        .route("/:id/earnings", get(agents::earnings))
        .route("/:id/payouts", get(agents::list_payouts));

    let payout_routes = Router::new()
        .route("/", post(payouts::request_payout))
        .route("/:id", get(payouts::get_payout))
        .route("/:id/approve", post(payouts::approve_payout))
        .route("/:id/reject", post(payouts::reject_payout))
        .route("/:id/mark-paid", post(payouts::mark_payout_paid));

    // layers run outside-in: auth first, so the request log sees the caller
    let api_routes = Router::new()
        .nest("/rules", rule_routes)
        .nest("/commissions", commission_routes)
        .nest("/agents", agent_routes)
        .nest("/payouts", payout_routes)
        .layer(axum_middleware::from_fn(request_log_middleware))
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
