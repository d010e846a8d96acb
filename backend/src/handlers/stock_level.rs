//! HTTP handlers for stock-level configuration

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared::models::StockLevel;

use crate::error::AppResult;
use crate::middleware::auth::require_direct_mutation;
use crate::middleware::CurrentUser;
use crate::services::stock_level::{CreateStockLevelInput, UpdateStockLevelInput};
use crate::services::StockLevelService;
use crate::AppState;

#[derive(Deserialize)]
pub struct StockLevelQuery {
    pub branch_id: Option<Uuid>,
}

#[derive(Serialize)]
pub struct LowStockEntry {
    #[serde(flatten)]
    pub level: StockLevel,
    pub available: Decimal,
}

/// Create a stock-level row
pub async fn create_stock_level(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateStockLevelInput>,
) -> AppResult<Json<StockLevel>> {
    require_direct_mutation(&current_user.0)?;
    let ctx = current_user.0.context()?;
    let service = StockLevelService::new(state.db);
    let level = service.create(&ctx, input).await?;
    Ok(Json(level))
}

/// Update a stock-level row
pub async fn update_stock_level(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(level_id): Path<Uuid>,
    Json(input): Json<UpdateStockLevelInput>,
) -> AppResult<Json<StockLevel>> {
    require_direct_mutation(&current_user.0)?;
    let ctx = current_user.0.context()?;
    let service = StockLevelService::new(state.db);
    let level = service.update(&ctx, level_id, input).await?;
    Ok(Json(level))
}

/// Delete a stock-level row
pub async fn delete_stock_level(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(level_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require_direct_mutation(&current_user.0)?;
    let ctx = current_user.0.context()?;
    let service = StockLevelService::new(state.db);
    service.delete(&ctx, level_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List stock levels for the tenant
pub async fn list_stock_levels(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<StockLevelQuery>,
) -> AppResult<Json<Vec<StockLevel>>> {
    let ctx = current_user.0.context()?;
    let service = StockLevelService::new(state.db);
    let levels = service.list(&ctx, query.branch_id).await?;
    Ok(Json(levels))
}

/// Items whose availability is at or below their configured threshold
pub async fn low_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<StockLevelQuery>,
) -> AppResult<Json<Vec<LowStockEntry>>> {
    let ctx = current_user.0.context()?;
    let service = StockLevelService::new(state.db);
    let entries = service
        .low_stock(&ctx, query.branch_id)
        .await?
        .into_iter()
        .map(|(level, available)| LowStockEntry { level, available })
        .collect();
    Ok(Json(entries))
}
