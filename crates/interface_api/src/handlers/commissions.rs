//! Commission record handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use crate::auth::{permissions, Claims};
use crate::dto::commissions::*;
use crate::handlers::typed;
use crate::{error::ApiError, AppState};

/// Records the commission for an application.
///
/// A second call for the same application answers 400 with the duplicate
/// error; workflow callers treat that as already processed.
pub async fn create_commission(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<CreateCommissionRequest>,
) -> Result<(StatusCode, Json<CommissionResponse>), ApiError> {
    claims.require(permissions::COMMISSION_CREATE)?;

    let input = request.into_input(state.earnings.currency())?;
    let record = state.ledger.create(input).await?;
    Ok((StatusCode::CREATED, Json(record.into())))
}

pub async fn get_commission(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<CommissionResponse>, ApiError> {
    claims.require(permissions::COMMISSION_READ)?;

    let record = state.ledger.get(typed(id)).await?;
    claims.require_access_to(record.agent_id)?;
    Ok(Json(record.into()))
}

pub async fn approve_commission(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<CommissionResponse>, ApiError> {
    claims.require(permissions::COMMISSION_APPROVE)?;

    let record = state.ledger.approve(typed(id), claims.user_id()?).await?;
    Ok(Json(record.into()))
}
