//! Commission rule catalog handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use domain_commission::RuleFilter;

use crate::auth::{permissions, Claims};
use crate::dto::rules::*;
use crate::handlers::{typed, validate_body};
use crate::{error::ApiError, AppState};

/// Creates a rule
pub async fn create_rule(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<CreateRuleRequest>,
) -> Result<(StatusCode, Json<RuleResponse>), ApiError> {
    claims.require(permissions::RULE_WRITE)?;
    validate_body(&request)?;

    let rule = state
        .catalog
        .create(request.into(), claims.user_id()?)
        .await?;
    Ok((StatusCode::CREATED, Json(rule.into())))
}

/// Lists rules, oldest first
pub async fn list_rules(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<RuleQuery>,
) -> Result<Json<Vec<RuleResponse>>, ApiError> {
    claims.require(permissions::RULE_READ)?;

    let filter = RuleFilter::try_from(query)?;
    let rules = state.catalog.list(filter).await?;
    Ok(Json(rules.into_iter().map(Into::into).collect()))
}

/// Gets a rule by ID
pub async fn get_rule(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<RuleResponse>, ApiError> {
    claims.require(permissions::RULE_READ)?;
    Ok(Json(state.catalog.get(typed(id)).await?.into()))
}

/// Reprices a rule; existing commission records keep their snapshot
pub async fn update_pricing(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdatePricingRequest>,
) -> Result<Json<RuleResponse>, ApiError> {
    claims.require(permissions::RULE_WRITE)?;

    let rule = state
        .catalog
        .update_pricing(typed(id), request.kind, request.value, claims.user_id()?)
        .await?;
    Ok(Json(rule.into()))
}

pub async fn deactivate_rule(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<RuleResponse>, ApiError> {
    claims.require(permissions::RULE_WRITE)?;
    let rule = state.catalog.deactivate(typed(id), claims.user_id()?).await?;
    Ok(Json(rule.into()))
}

pub async fn activate_rule(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<RuleResponse>, ApiError> {
    claims.require(permissions::RULE_WRITE)?;
    let rule = state.catalog.activate(typed(id), claims.user_id()?).await?;
    Ok(Json(rule.into()))
}
