//! HTTP handlers for waste events

use axum::{
    extract::{Query, State},
    Json,
};

use shared::models::WasteEvent;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::waste::{RecordWasteInput, WasteFilter};
use crate::services::WasteService;
use crate::AppState;

/// Record a waste event. Creation is open to every mutating role — only
/// later edits and deletions go through the approval workflow.
pub async fn record_waste(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<RecordWasteInput>,
) -> AppResult<Json<WasteEvent>> {
    let ctx = current_user.0.context()?;
    let service = WasteService::new(state.db);
    let event = service
        .record_event(&ctx, current_user.0.user_id, input)
        .await?;
    Ok(Json(event))
}

/// List waste events for the tenant
pub async fn list_waste(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(filter): Query<WasteFilter>,
) -> AppResult<Json<Vec<WasteEvent>>> {
    let ctx = current_user.0.context()?;
    let service = WasteService::new(state.db);
    let events = service.list_events(&ctx, filter).await?;
    Ok(Json(events))
}
