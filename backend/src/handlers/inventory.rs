//! HTTP handlers for the inventory ledger endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::models::{InventoryBatch, InventoryItemPatch};

use crate::error::AppResult;
use crate::middleware::auth::require_direct_mutation;
use crate::middleware::CurrentUser;
use crate::services::inventory::{AddBatchInput, DeductInput, DeductionOutcome};
use crate::services::LedgerService;
use crate::AppState;

#[derive(Deserialize)]
pub struct BranchQuery {
    pub branch_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct AvailableQuery {
    pub item: String,
    pub unit: String,
    pub branch_id: Option<Uuid>,
}

/// Receive a new inventory batch
pub async fn add_batch(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<AddBatchInput>,
) -> AppResult<Json<InventoryBatch>> {
    let ctx = current_user.0.context()?;
    let service = LedgerService::new(state.db);
    let batch = service.add_batch(&ctx, input).await?;
    Ok(Json(batch))
}

/// List batches for the tenant
pub async fn list_batches(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<BranchQuery>,
) -> AppResult<Json<Vec<InventoryBatch>>> {
    let ctx = current_user.0.context()?;
    let service = LedgerService::new(state.db);
    let batches = service.list_batches(&ctx, query.branch_id).await?;
    Ok(Json(batches))
}

/// Get a single batch
pub async fn get_batch(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(batch_id): Path<Uuid>,
) -> AppResult<Json<InventoryBatch>> {
    let ctx = current_user.0.context()?;
    let service = LedgerService::new(state.db);
    let batch = service.get_batch(&ctx, batch_id).await?;
    Ok(Json(batch))
}

/// Available batches for an item in FIFO order (read-only)
pub async fn query_available(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<AvailableQuery>,
) -> AppResult<Json<Vec<InventoryBatch>>> {
    let ctx = current_user.0.context()?;
    let service = LedgerService::new(state.db);
    let batches = service
        .query_available(&ctx, &query.item, &query.unit, query.branch_id)
        .await?;
    Ok(Json(batches))
}

/// Strict FIFO deduction (direct inventory edit; privileged roles only)
pub async fn deduct(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<DeductInput>,
) -> AppResult<Json<DeductionOutcome>> {
    require_direct_mutation(&current_user.0)?;
    let ctx = current_user.0.context()?;
    let service = LedgerService::new(state.db);
    let outcome = service.deduct(&ctx, input).await?;
    Ok(Json(outcome))
}

/// Direct batch edit (privileged roles only; staff submit approval requests)
pub async fn update_batch(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(batch_id): Path<Uuid>,
    Json(patch): Json<InventoryItemPatch>,
) -> AppResult<Response> {
    require_direct_mutation(&current_user.0)?;
    let ctx = current_user.0.context()?;
    let service = LedgerService::new(state.db);
    match service.update_batch(&ctx, batch_id, patch).await? {
        Some(batch) => Ok(Json(batch).into_response()),
        // Quantity was edited to zero; the batch is gone.
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

/// Direct batch removal (privileged roles only)
pub async fn delete_batch(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(batch_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require_direct_mutation(&current_user.0)?;
    let ctx = current_user.0.context()?;
    let service = LedgerService::new(state.db);
    service.delete_batch(&ctx, batch_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
