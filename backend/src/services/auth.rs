//! Authentication service for tenant registration, login, and token management

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use shared::models::Role;

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    jwt_secret: String,
    access_token_expiry: i64,
    refresh_token_expiry: i64,
}

/// Input for registering a new tenant with its owner account
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterTenantInput {
    #[validate(length(min = 1, message = "Tenant name is required"))]
    pub tenant_name: String,
    #[validate(length(min = 1, message = "Branch name is required"))]
    pub branch_name: String,
    #[validate(length(min = 1, message = "Owner name is required"))]
    pub owner_name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Response after successful registration
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub tenant_id: Uuid,
    pub branch_id: Uuid,
    pub user_id: Uuid,
    #[serde(flatten)]
    pub tokens: AuthTokens,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub tenant_id: String,
    pub branch_id: Option<String>,
    pub role: String,
    pub token_use: String,
    pub exp: i64,
    pub iat: i64,
}

/// Authentication tokens
#[derive(Debug, Serialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// User info from database
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    tenant_id: Uuid,
    branch_id: Option<Uuid>,
    password_hash: String,
    role: String,
    is_active: bool,
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            db,
            jwt_secret: config.jwt.secret.clone(),
            access_token_expiry: config.jwt.access_token_expiry,
            refresh_token_expiry: config.jwt.refresh_token_expiry,
        }
    }

    /// Register a new tenant with a first branch and its owner account
    pub async fn register_tenant(&self, input: RegisterTenantInput) -> AppResult<RegisterResponse> {
        input.validate()?;

        let password_hash = hash(&input.password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        let mut tx = self.db.begin().await?;

        let tenant_id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO tenants (name) VALUES ($1) RETURNING id",
        )
        .bind(&input.tenant_name)
        .fetch_one(&mut *tx)
        .await?;

        let branch_id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO branches (tenant_id, name) VALUES ($1, $2) RETURNING id",
        )
        .bind(tenant_id)
        .bind(&input.branch_name)
        .fetch_one(&mut *tx)
        .await?;

        let user_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO users (tenant_id, branch_id, email, password_hash, name, role)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(tenant_id)
        .bind(branch_id)
        .bind(&input.email)
        .bind(&password_hash)
        .bind(&input.owner_name)
        .bind(Role::Owner.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::DuplicateEntry("email".to_string())
            }
            _ => AppError::DatabaseError(e),
        })?;

        tx.commit().await?;

        let tokens = self.issue_tokens(user_id, tenant_id, Some(branch_id), Role::Owner)?;

        Ok(RegisterResponse {
            tenant_id,
            branch_id,
            user_id,
            tokens,
        })
    }

    /// Authenticate a user and issue tokens
    pub async fn login(&self, email: &str, password: &str) -> AppResult<AuthTokens> {
        let user = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, tenant_id, branch_id, password_hash, role, is_active
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

        if !user.is_active {
            return Err(AppError::InvalidCredentials);
        }

        let valid = verify(password, &user.password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;
        if !valid {
            return Err(AppError::InvalidCredentials);
        }

        let role = user
            .role
            .parse::<Role>()
            .map_err(|e| AppError::Internal(format!("Corrupt role on user record: {}", e)))?;

        self.issue_tokens(user.id, user.tenant_id, user.branch_id, role)
    }

    /// Exchange a refresh token for a fresh token pair
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<AuthTokens> {
        let claims = decode::<Claims>(
            refresh_token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?
        .claims;

        if claims.token_use != "refresh" {
            return Err(AppError::InvalidToken);
        }

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::InvalidToken)?;

        // Reload the user so a deactivated account or a role change takes
        // effect at refresh time.
        let user = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, tenant_id, branch_id, password_hash, role, is_active
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::InvalidToken)?;

        if !user.is_active {
            return Err(AppError::InvalidCredentials);
        }

        let role = user
            .role
            .parse::<Role>()
            .map_err(|e| AppError::Internal(format!("Corrupt role on user record: {}", e)))?;

        self.issue_tokens(user.id, user.tenant_id, user.branch_id, role)
    }

    /// Issue an access/refresh token pair
    fn issue_tokens(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
        branch_id: Option<Uuid>,
        role: Role,
    ) -> AppResult<AuthTokens> {
        let access_token = self.encode_token(
            user_id,
            tenant_id,
            branch_id,
            role,
            "access",
            self.access_token_expiry,
        )?;
        let refresh_token = self.encode_token(
            user_id,
            tenant_id,
            branch_id,
            role,
            "refresh",
            self.refresh_token_expiry,
        )?;

        Ok(AuthTokens {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry,
        })
    }

    fn encode_token(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
        branch_id: Option<Uuid>,
        role: Role,
        token_use: &str,
        expiry_seconds: i64,
    ) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            tenant_id: tenant_id.to_string(),
            branch_id: branch_id.map(|b| b.to_string()),
            role: role.as_str().to_string(),
            token_use: token_use.to_string(),
            exp: (now + Duration::seconds(expiry_seconds)).timestamp(),
            iat: now.timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token encoding failed: {}", e)))
    }
}
