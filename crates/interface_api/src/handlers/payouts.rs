//! Payout request handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use core_kernel::{AgentId, Money};

use crate::auth::{permissions, Claims};
use crate::dto::payouts::*;
use crate::handlers::{typed, validate_body};
use crate::{error::ApiError, AppState};

/// Submits a payout request against the approved balance
pub async fn request_payout(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<CreatePayoutRequest>,
) -> Result<(StatusCode, Json<PayoutResponse>), ApiError> {
    claims.require(permissions::PAYOUT_REQUEST)?;
    validate_body(&request)?;

    let agent_id = match (claims.agent_id(), request.agent_id) {
        (Some(own), None) => own,
        (_, Some(target)) => AgentId::from(target),
        (None, None) => {
            return Err(ApiError::BadRequest("agent_id is required".to_string()));
        }
    };
    claims.require_access_to(agent_id)?;

    let amount = Money::new(request.amount, state.earnings.currency());
    let payout = state.payouts.request(agent_id, amount, request.notes).await?;
    Ok((StatusCode::CREATED, Json(payout.into())))
}

pub async fn get_payout(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<PayoutResponse>, ApiError> {
    claims.require(permissions::PAYOUT_READ)?;

    let payout = state.payouts.get(typed(id)).await?;
    claims.require_access_to(payout.agent_id)?;
    Ok(Json(payout.into()))
}

/// Approves a payout and settles the agent's approved commissions
pub async fn approve_payout(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(request): Json<ApprovePayoutRequest>,
) -> Result<Json<PayoutResponse>, ApiError> {
    claims.require(permissions::PAYOUT_PROCESS)?;
    validate_body(&request)?;

    let payout = state
        .payouts
        .approve(
            typed(id),
            claims.user_id()?,
            request.payment_method,
            request.payment_reference,
        )
        .await?;
    Ok(Json(payout.into()))
}

pub async fn reject_payout(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(request): Json<RejectPayoutRequest>,
) -> Result<Json<PayoutResponse>, ApiError> {
    claims.require(permissions::PAYOUT_PROCESS)?;
    validate_body(&request)?;

    let payout = state
        .payouts
        .reject(typed(id), claims.user_id()?, request.notes)
        .await?;
    Ok(Json(payout.into()))
}

pub async fn mark_payout_paid(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(request): Json<MarkPaidRequest>,
) -> Result<Json<PayoutResponse>, ApiError> {
    claims.require(permissions::PAYOUT_PROCESS)?;
    validate_body(&request)?;

    let payout = state
        .payouts
        .mark_paid(typed(id), claims.user_id()?, request.payment_reference)
        .await?;
    Ok(Json(payout.into()))
}
