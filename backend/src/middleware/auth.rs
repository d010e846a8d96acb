//! Authentication middleware
//!
//! JWT authentication and tenant-scope extraction. The middleware validates
//! the bearer token and turns its claims into an `AuthUser`; handlers obtain
//! a `TenantContext` from it, so no ambient tenant state exists anywhere
//! downstream.

use axum::{
    extract::Request,
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::str::FromStr;

use shared::models::Role;
use shared::types::TenantContext;

use crate::error::{AppError, AppResult, ErrorResponse};

/// Authenticated user information extracted from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: uuid::Uuid,
    pub tenant_id: uuid::Uuid,
    pub branch_id: Option<uuid::Uuid>,
    pub role: Role,
}

impl AuthUser {
    /// Tenant scope for service calls. The constructor re-checks the tenant
    /// id so a forged nil claim surfaces as a scope violation, not a query
    /// against nothing.
    pub fn context(&self) -> AppResult<TenantContext> {
        Ok(TenantContext::new(
            self.tenant_id,
            self.branch_id,
            self.role,
        )?)
    }
}

/// Authentication middleware that validates JWT tokens
/// Note: token validation is done inline to avoid state dependency issues.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    // Extract Authorization header
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) if header.starts_with("Bearer ") => &header[7..],
        _ => {
            return unauthorized_response("Missing or invalid Authorization header");
        }
    };

    // Get JWT secret from environment (fallback for middleware without state)
    let jwt_secret = std::env::var("ROPS__JWT__SECRET")
        .or_else(|_| std::env::var("ROPS_JWT_SECRET"))
        .unwrap_or_else(|_| "development-secret-key".to_string());

    let claims = match decode_jwt(token, &jwt_secret) {
        Ok(claims) => claims,
        Err(msg) => {
            return unauthorized_response(&msg);
        }
    };

    // Refresh tokens cannot be used to call the API directly
    if claims.token_use != "access" {
        return unauthorized_response("Refresh token cannot be used for API access");
    }

    let user_id = match uuid::Uuid::parse_str(&claims.sub) {
        Ok(id) => id,
        Err(_) => return unauthorized_response("Invalid user ID in token"),
    };

    let tenant_id = match uuid::Uuid::parse_str(&claims.tenant_id) {
        Ok(id) => id,
        Err(_) => return unauthorized_response("Invalid tenant ID in token"),
    };

    let branch_id = match &claims.branch_id {
        Some(raw) => match uuid::Uuid::parse_str(raw) {
            Ok(id) => Some(id),
            Err(_) => return unauthorized_response("Invalid branch ID in token"),
        },
        None => None,
    };

    let role = match Role::from_str(&claims.role) {
        Ok(role) => role,
        Err(_) => return unauthorized_response("Invalid role in token"),
    };

    let auth_user = AuthUser {
        user_id,
        tenant_id,
        branch_id,
        role,
    };

    request.extensions_mut().insert(auth_user);

    next.run(request).await
}

/// JWT claims structure
#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct Claims {
    sub: String,
    tenant_id: String,
    branch_id: Option<String>,
    role: String,
    token_use: String,
    exp: i64,
    iat: i64,
}

/// Decode and validate JWT token
fn decode_jwt(token: &str, secret: &str) -> Result<Claims, String> {
    use jsonwebtoken::{decode, DecodingKey, Validation};

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| format!("Invalid token: {}", e))
}

/// Create unauthorized response
fn unauthorized_response(message: &str) -> Response {
    let error = ErrorResponse {
        error: crate::error::ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message: message.to_string(),
            field: None,
        },
    };

    (StatusCode::UNAUTHORIZED, Json(error)).into_response()
}

/// Extractor for authenticated user
/// Use this in handlers to get the current user
#[derive(Clone, Debug)]
pub struct CurrentUser(pub AuthUser);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| {
                let error = ErrorResponse {
                    error: crate::error::ErrorDetail {
                        code: "UNAUTHORIZED".to_string(),
                        message: "Authentication required".to_string(),
                        field: None,
                    },
                };
                (StatusCode::UNAUTHORIZED, Json(error))
            })
    }
}

/// Permission guard for mutating operations that bypass the approval
/// workflow. Staff actors must submit an approval request instead.
pub fn require_direct_mutation(user: &AuthUser) -> AppResult<()> {
    if user.role.can_mutate_directly() {
        Ok(())
    } else {
        Err(AppError::InsufficientPermissions)
    }
}
