//! HTTP handlers for the tenant and branch registry

use axum::{extract::State, Json};

use shared::models::{Branch, Tenant};

use crate::error::AppResult;
use crate::middleware::auth::require_direct_mutation;
use crate::middleware::CurrentUser;
use crate::services::tenant::CreateBranchInput;
use crate::services::TenantService;
use crate::AppState;

/// The caller's tenant record
pub async fn get_tenant(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Tenant>> {
    let ctx = current_user.0.context()?;
    let service = TenantService::new(state.db);
    let tenant = service.get_tenant(&ctx).await?;
    Ok(Json(tenant))
}

/// List branches of the caller's tenant
pub async fn list_branches(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<Branch>>> {
    let ctx = current_user.0.context()?;
    let service = TenantService::new(state.db);
    let branches = service.list_branches(&ctx).await?;
    Ok(Json(branches))
}

/// Open a new branch (manager or owner)
pub async fn create_branch(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateBranchInput>,
) -> AppResult<Json<Branch>> {
    require_direct_mutation(&current_user.0)?;
    let ctx = current_user.0.context()?;
    let service = TenantService::new(state.db);
    let branch = service.create_branch(&ctx, input).await?;
    Ok(Json(branch))
}
