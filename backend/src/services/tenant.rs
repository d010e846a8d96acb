//! Tenant and branch registry service

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use shared::models::{Branch, Tenant};
use shared::types::TenantContext;

use crate::error::{AppError, AppResult};

/// Tenant registry service
#[derive(Clone)]
pub struct TenantService {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct TenantRow {
    id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct BranchRow {
    id: Uuid,
    tenant_id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
}

/// Input for creating a branch
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBranchInput {
    #[validate(length(min = 1, message = "Branch name is required"))]
    pub name: String,
}

impl TenantService {
    /// Create a new TenantService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// The caller's own tenant record
    pub async fn get_tenant(&self, ctx: &TenantContext) -> AppResult<Tenant> {
        let row = sqlx::query_as::<_, TenantRow>(
            "SELECT id, name, created_at FROM tenants WHERE id = $1",
        )
        .bind(ctx.tenant_id())
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Tenant".to_string()))?;

        Ok(Tenant {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
        })
    }

    /// Branches of the caller's tenant
    pub async fn list_branches(&self, ctx: &TenantContext) -> AppResult<Vec<Branch>> {
        let rows = sqlx::query_as::<_, BranchRow>(
            r#"
            SELECT id, tenant_id, name, created_at
            FROM branches
            WHERE tenant_id = $1
            ORDER BY name ASC
            "#,
        )
        .bind(ctx.tenant_id())
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| Branch {
                id: row.id,
                tenant_id: row.tenant_id,
                name: row.name,
                created_at: row.created_at,
            })
            .collect())
    }

    /// Open a new branch
    pub async fn create_branch(
        &self,
        ctx: &TenantContext,
        input: CreateBranchInput,
    ) -> AppResult<Branch> {
        input.validate()?;

        let row = sqlx::query_as::<_, BranchRow>(
            r#"
            INSERT INTO branches (tenant_id, name)
            VALUES ($1, $2)
            RETURNING id, tenant_id, name, created_at
            "#,
        )
        .bind(ctx.tenant_id())
        .bind(&input.name)
        .fetch_one(&self.db)
        .await?;

        Ok(Branch {
            id: row.id,
            tenant_id: row.tenant_id,
            name: row.name,
            created_at: row.created_at,
        })
    }
}
