//! Per-agent views: commissions, earnings and payouts

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use uuid::Uuid;

use core_kernel::AgentId;

use crate::auth::{permissions, Claims};
use crate::dto::commissions::*;
use crate::dto::payouts::PayoutResponse;
use crate::{error::ApiError, AppState};

fn authorize(claims: &Claims, permission: &str, agent_id: AgentId) -> Result<(), ApiError> {
    claims.require(permission)?;
    claims.require_access_to(agent_id)?;
    Ok(())
}

/// Lists an agent's commission records, optionally by status
pub async fn list_commissions(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(agent_id): Path<Uuid>,
    Query(query): Query<CommissionListQuery>,
) -> Result<Json<Vec<CommissionResponse>>, ApiError> {
    let agent_id = AgentId::from(agent_id);
    authorize(&claims, permissions::COMMISSION_READ, agent_id)?;

    let records = state.ledger.list_by_agent(agent_id, query.status).await?;
    Ok(Json(records.into_iter().map(Into::into).collect()))
}

/// Pending, approved and paid totals for an agent
pub async fn earnings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(agent_id): Path<Uuid>,
) -> Result<Json<EarningsResponse>, ApiError> {
    let agent_id = AgentId::from(agent_id);
    authorize(&claims, permissions::EARNINGS_READ, agent_id)?;

    let summary = state.earnings.summarize(agent_id).await?;
    Ok(Json(summary.into()))
}

/// An agent's payouts, newest first
pub async fn list_payouts(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(agent_id): Path<Uuid>,
) -> Result<Json<Vec<PayoutResponse>>, ApiError> {
    let agent_id = AgentId::from(agent_id);
    authorize(&claims, permissions::PAYOUT_READ, agent_id)?;

    let payouts = state.payouts.list_by_agent(agent_id).await?;
    Ok(Json(payouts.into_iter().map(Into::into).collect()))
}
