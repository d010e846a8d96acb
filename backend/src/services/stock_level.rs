//! Stock-level configuration service
//!
//! One row per (tenant, branch, item, category, unit) — the compound key is
//! unique. Besides the low-stock threshold, the row remembers the
//! last-received unit cost, which the ledger maintains on every batch
//! receipt and the cost engine falls back to once an item's batches are all
//! consumed.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use shared::models::StockLevel;
use shared::types::TenantContext;

use crate::error::{AppError, AppResult};

/// Stock-level configuration service
#[derive(Clone)]
pub struct StockLevelService {
    db: PgPool,
}

/// Database row for a stock level
#[derive(Debug, FromRow)]
struct StockLevelRow {
    id: Uuid,
    tenant_id: Uuid,
    branch_id: Uuid,
    item_name: String,
    category: String,
    unit: String,
    min_quantity: Decimal,
    is_active: bool,
    last_unit_cost: Option<Decimal>,
    last_received_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<StockLevelRow> for StockLevel {
    fn from(row: StockLevelRow) -> Self {
        StockLevel {
            id: row.id,
            tenant_id: row.tenant_id,
            branch_id: row.branch_id,
            item_name: row.item_name,
            category: row.category,
            unit: row.unit,
            min_quantity: row.min_quantity,
            is_active: row.is_active,
            last_unit_cost: row.last_unit_cost,
            last_received_at: row.last_received_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Row for the low-stock query
#[derive(Debug, FromRow)]
struct LowStockRow {
    #[sqlx(flatten)]
    level: StockLevelRow,
    available: Decimal,
}

const LEVEL_COLUMNS: &str = "id, tenant_id, branch_id, item_name, category, unit, min_quantity, \
                             is_active, last_unit_cost, last_received_at, created_at, updated_at";

/// Input for creating a stock level
#[derive(Debug, Deserialize, Validate)]
pub struct CreateStockLevelInput {
    pub branch_id: Option<Uuid>,
    #[validate(length(min = 1, message = "Item name is required"))]
    pub item_name: String,
    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,
    #[validate(length(min = 1, message = "Unit of measure is required"))]
    pub unit: String,
    #[validate(custom = "shared::validation::non_negative_cost")]
    pub min_quantity: Decimal,
    pub is_active: Option<bool>,
}

/// Input for updating a stock level
#[derive(Debug, Deserialize)]
pub struct UpdateStockLevelInput {
    pub min_quantity: Option<Decimal>,
    pub is_active: Option<bool>,
}

impl StockLevelService {
    /// Create a new StockLevelService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a stock-level row for an item
    pub async fn create(
        &self,
        ctx: &TenantContext,
        input: CreateStockLevelInput,
    ) -> AppResult<StockLevel> {
        input.validate()?;

        let branch_id = match input.branch_id {
            Some(id) => id,
            None => ctx.branch_id()?,
        };
        let is_active = input.is_active.unwrap_or(true);

        let row = sqlx::query_as::<_, StockLevelRow>(&format!(
            r#"
            INSERT INTO stock_levels
                (tenant_id, branch_id, item_name, category, unit, min_quantity, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {LEVEL_COLUMNS}
            "#
        ))
        .bind(ctx.tenant_id())
        .bind(branch_id)
        .bind(&input.item_name)
        .bind(&input.category)
        .bind(&input.unit)
        .bind(input.min_quantity)
        .bind(is_active)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::DuplicateEntry("stock level".to_string())
            }
            _ => AppError::DatabaseError(e),
        })?;

        Ok(row.into())
    }

    /// Update threshold or active flag
    pub async fn update(
        &self,
        ctx: &TenantContext,
        level_id: Uuid,
        input: UpdateStockLevelInput,
    ) -> AppResult<StockLevel> {
        if let Some(min_quantity) = input.min_quantity {
            if min_quantity < Decimal::ZERO {
                return Err(AppError::InvalidQuantity(format!(
                    "minimum quantity cannot be negative, got {}",
                    min_quantity
                )));
            }
        }

        let row = sqlx::query_as::<_, StockLevelRow>(&format!(
            r#"
            UPDATE stock_levels
            SET min_quantity = COALESCE($1, min_quantity),
                is_active = COALESCE($2, is_active),
                updated_at = NOW()
            WHERE id = $3 AND tenant_id = $4
            RETURNING {LEVEL_COLUMNS}
            "#
        ))
        .bind(input.min_quantity)
        .bind(input.is_active)
        .bind(level_id)
        .bind(ctx.tenant_id())
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Stock level".to_string()))?;

        Ok(row.into())
    }

    /// Delete a stock-level row
    pub async fn delete(&self, ctx: &TenantContext, level_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM stock_levels WHERE id = $1 AND tenant_id = $2")
            .bind(level_id)
            .bind(ctx.tenant_id())
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Stock level".to_string()));
        }

        Ok(())
    }

    /// List stock levels for the tenant
    pub async fn list(
        &self,
        ctx: &TenantContext,
        branch_id: Option<Uuid>,
    ) -> AppResult<Vec<StockLevel>> {
        let rows = sqlx::query_as::<_, StockLevelRow>(&format!(
            r#"
            SELECT {LEVEL_COLUMNS}
            FROM stock_levels
            WHERE tenant_id = $1 AND ($2::uuid IS NULL OR branch_id = $2)
            ORDER BY item_name ASC, unit ASC
            "#
        ))
        .bind(ctx.tenant_id())
        .bind(branch_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Active rows whose summed available batch quantity is at or below the
    /// threshold, with the current availability
    pub async fn low_stock(
        &self,
        ctx: &TenantContext,
        branch_id: Option<Uuid>,
    ) -> AppResult<Vec<(StockLevel, Decimal)>> {
        let rows = sqlx::query_as::<_, LowStockRow>(
            r#"
            SELECT sl.id, sl.tenant_id, sl.branch_id, sl.item_name, sl.category, sl.unit,
                   sl.min_quantity, sl.is_active, sl.last_unit_cost, sl.last_received_at,
                   sl.created_at, sl.updated_at,
                   COALESCE(SUM(b.quantity), 0) AS available
            FROM stock_levels sl
            LEFT JOIN inventory_batches b
                   ON b.tenant_id = sl.tenant_id AND b.branch_id = sl.branch_id
                  AND b.item_name = sl.item_name AND b.unit = sl.unit
            WHERE sl.tenant_id = $1 AND sl.is_active = true
              AND ($2::uuid IS NULL OR sl.branch_id = $2)
            GROUP BY sl.id, sl.tenant_id, sl.branch_id, sl.item_name, sl.category, sl.unit,
                     sl.min_quantity, sl.is_active, sl.last_unit_cost, sl.last_received_at,
                     sl.created_at, sl.updated_at
            HAVING COALESCE(SUM(b.quantity), 0) <= sl.min_quantity
            ORDER BY sl.item_name ASC
            "#,
        )
        .bind(ctx.tenant_id())
        .bind(branch_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| (r.level.into(), r.available))
            .collect())
    }
}
