//! HTTP handlers for the approval workflow

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::models::{ApprovalRequest, ApprovalStatus};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::approval::{ReviewDecision, SubmitApprovalInput};
use crate::services::ApprovalService;
use crate::AppState;

#[derive(Deserialize)]
pub struct ApprovalListQuery {
    pub status: Option<ApprovalStatus>,
}

#[derive(Deserialize)]
pub struct ReviewRequest {
    pub decision: ReviewDecision,
}

/// Submit an approval request (staff role)
pub async fn submit_approval(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<SubmitApprovalInput>,
) -> AppResult<Json<ApprovalRequest>> {
    let ctx = current_user.0.context()?;
    let service = ApprovalService::new(state.db);
    let request = service.submit(&ctx, current_user.0.user_id, input).await?;
    Ok(Json(request))
}

/// List approval requests for the tenant
pub async fn list_approvals(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ApprovalListQuery>,
) -> AppResult<Json<Vec<ApprovalRequest>>> {
    let ctx = current_user.0.context()?;
    let service = ApprovalService::new(state.db);
    let requests = service.list(&ctx, query.status).await?;
    Ok(Json(requests))
}

/// Get a single approval request
pub async fn get_approval(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(request_id): Path<Uuid>,
) -> AppResult<Json<ApprovalRequest>> {
    let ctx = current_user.0.context()?;
    let service = ApprovalService::new(state.db);
    let request = service.get(&ctx, request_id).await?;
    Ok(Json(request))
}

/// Review a pending approval request (manager or owner role)
pub async fn review_approval(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(request_id): Path<Uuid>,
    Json(body): Json<ReviewRequest>,
) -> AppResult<Json<ApprovalRequest>> {
    let ctx = current_user.0.context()?;
    let service = ApprovalService::new(state.db);
    let request = service
        .review(&ctx, current_user.0.user_id, request_id, body.decision)
        .await?;
    Ok(Json(request))
}
