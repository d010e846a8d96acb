//! Authentication handlers

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::error::AppResult;
use crate::services::auth::{AuthTokens, RegisterResponse, RegisterTenantInput};
use crate::services::AuthService;
use crate::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Register a new tenant with its owner account
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterTenantInput>,
) -> AppResult<Json<RegisterResponse>> {
    let auth_service = AuthService::new(state.db.clone(), &state.config);
    let response = auth_service.register_tenant(body).await?;
    Ok(Json(response))
}

/// Login endpoint handler
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<AuthTokens>> {
    let auth_service = AuthService::new(state.db.clone(), &state.config);
    let tokens = auth_service.login(&body.email, &body.password).await?;
    Ok(Json(tokens))
}

/// Exchange a refresh token for a fresh token pair
pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> AppResult<Json<AuthTokens>> {
    let auth_service = AuthService::new(state.db.clone(), &state.config);
    let tokens = auth_service.refresh(&body.refresh_token).await?;
    Ok(Json(tokens))
}
