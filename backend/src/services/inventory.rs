//! Inventory ledger service
//!
//! Owns the batch table and the FIFO deduction primitive. Every mutation runs
//! inside a single transaction; deductions lock the batches they consume with
//! `SELECT ... FOR UPDATE` in FIFO order, which serializes concurrent
//! deductions per (tenant, branch, item, unit) and keeps quantity-on-hand
//! from going negative.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;
use validator::Validate;

use shared::models::{
    attribute_cost, latest_unit_cost, plan_fifo_deduction, CostBreakdown, DeductionLine,
    DeductionPlan, InventoryBatch, InventoryItemPatch,
};
use shared::types::TenantContext;

use crate::error::{AppError, AppResult};

/// Ledger service for batch-based inventory
#[derive(Clone)]
pub struct LedgerService {
    db: PgPool,
}

/// Database row for an inventory batch
#[derive(Debug, FromRow)]
struct BatchRow {
    id: Uuid,
    tenant_id: Uuid,
    branch_id: Uuid,
    item_name: String,
    category: String,
    unit: String,
    quantity: Decimal,
    unit_cost: Decimal,
    received_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<BatchRow> for InventoryBatch {
    fn from(row: BatchRow) -> Self {
        InventoryBatch {
            id: row.id,
            tenant_id: row.tenant_id,
            branch_id: row.branch_id,
            item_name: row.item_name,
            category: row.category,
            unit: row.unit,
            quantity: row.quantity,
            unit_cost: row.unit_cost,
            received_at: row.received_at,
            expires_at: row.expires_at,
            created_at: row.created_at,
        }
    }
}

const BATCH_COLUMNS: &str = "id, tenant_id, branch_id, item_name, category, unit, quantity, \
                             unit_cost, received_at, expires_at, created_at";

/// Input for receiving a new batch
#[derive(Debug, Deserialize, Validate)]
pub struct AddBatchInput {
    pub branch_id: Option<Uuid>,
    #[validate(length(min = 1, message = "Item name is required"))]
    pub item_name: String,
    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,
    #[validate(length(min = 1, message = "Unit of measure is required"))]
    pub unit: String,
    #[validate(custom = "shared::validation::positive_quantity")]
    pub quantity: Decimal,
    #[validate(custom = "shared::validation::non_negative_cost")]
    pub unit_cost: Decimal,
    pub received_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Input for a strict deduction (inventory edit path)
#[derive(Debug, Deserialize)]
pub struct DeductInput {
    pub branch_id: Option<Uuid>,
    pub item_name: String,
    pub unit: String,
    pub quantity: Decimal,
}

/// Result of a successful strict deduction
#[derive(Debug, Serialize)]
pub struct DeductionOutcome {
    pub lines: Vec<DeductionLine>,
    pub consumed: Decimal,
    pub cost: CostBreakdown,
}

impl LedgerService {
    /// Create a new LedgerService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Receive a new batch. The stock-level row for the item remembers the
    /// received unit cost so the cost-estimation fallback survives full
    /// consumption of every batch.
    pub async fn add_batch(
        &self,
        ctx: &TenantContext,
        input: AddBatchInput,
    ) -> AppResult<InventoryBatch> {
        input.validate()?;

        let tenant_id = ctx.tenant_id();
        let branch_id = match input.branch_id {
            Some(id) => id,
            None => ctx.branch_id()?,
        };
        let received_at = input.received_at.unwrap_or_else(Utc::now);

        let mut tx = self.db.begin().await?;

        let batch = sqlx::query_as::<_, BatchRow>(&format!(
            r#"
            INSERT INTO inventory_batches
                (tenant_id, branch_id, item_name, category, unit, quantity, unit_cost,
                 received_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {BATCH_COLUMNS}
            "#
        ))
        .bind(tenant_id)
        .bind(branch_id)
        .bind(&input.item_name)
        .bind(&input.category)
        .bind(&input.unit)
        .bind(input.quantity)
        .bind(input.unit_cost)
        .bind(received_at)
        .bind(input.expires_at)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO stock_levels
                (tenant_id, branch_id, item_name, category, unit, min_quantity, is_active,
                 last_unit_cost, last_received_at)
            VALUES ($1, $2, $3, $4, $5, 0, true, $6, $7)
            ON CONFLICT (tenant_id, branch_id, item_name, category, unit)
            DO UPDATE SET
                last_unit_cost = EXCLUDED.last_unit_cost,
                last_received_at = EXCLUDED.last_received_at,
                updated_at = NOW()
            WHERE stock_levels.last_received_at IS NULL
               OR stock_levels.last_received_at <= EXCLUDED.last_received_at
            "#,
        )
        .bind(tenant_id)
        .bind(branch_id)
        .bind(&input.item_name)
        .bind(&input.category)
        .bind(&input.unit)
        .bind(input.unit_cost)
        .bind(received_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(batch.into())
    }

    /// List batches for the tenant, optionally filtered to one branch
    pub async fn list_batches(
        &self,
        ctx: &TenantContext,
        branch_id: Option<Uuid>,
    ) -> AppResult<Vec<InventoryBatch>> {
        let rows = sqlx::query_as::<_, BatchRow>(&format!(
            r#"
            SELECT {BATCH_COLUMNS}
            FROM inventory_batches
            WHERE tenant_id = $1 AND ($2::uuid IS NULL OR branch_id = $2)
            ORDER BY item_name ASC, received_at ASC, id ASC
            "#
        ))
        .bind(ctx.tenant_id())
        .bind(branch_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a single batch
    pub async fn get_batch(&self, ctx: &TenantContext, batch_id: Uuid) -> AppResult<InventoryBatch> {
        let row = sqlx::query_as::<_, BatchRow>(&format!(
            "SELECT {BATCH_COLUMNS} FROM inventory_batches WHERE id = $1 AND tenant_id = $2"
        ))
        .bind(batch_id)
        .bind(ctx.tenant_id())
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Batch".to_string()))?;

        Ok(row.into())
    }

    /// All batches with quantity-on-hand > 0 for an item/unit, oldest stock
    /// first (the FIFO contract), ties broken by batch id. A `None` branch
    /// searches the whole tenant.
    pub async fn query_available(
        &self,
        ctx: &TenantContext,
        item_name: &str,
        unit: &str,
        branch_id: Option<Uuid>,
    ) -> AppResult<Vec<InventoryBatch>> {
        shared::validation::validate_unit(unit).map_err(|msg| AppError::Validation {
            field: "unit".to_string(),
            message: msg.to_string(),
        })?;

        let rows = sqlx::query_as::<_, BatchRow>(&format!(
            r#"
            SELECT {BATCH_COLUMNS}
            FROM inventory_batches
            WHERE tenant_id = $1 AND item_name = $2 AND unit = $3
              AND ($4::uuid IS NULL OR branch_id = $4)
              AND quantity > 0
            ORDER BY received_at ASC, id ASC
            "#
        ))
        .bind(ctx.tenant_id())
        .bind(item_name)
        .bind(unit)
        .bind(branch_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Strict FIFO deduction: either the full requested quantity is consumed
    /// and committed, or nothing is. Used by the direct inventory-edit path;
    /// a shortfall surfaces as `InsufficientInventory` with no state change.
    pub async fn deduct(&self, ctx: &TenantContext, input: DeductInput) -> AppResult<DeductionOutcome> {
        if input.quantity <= Decimal::ZERO {
            return Err(AppError::InvalidQuantity(format!(
                "requested quantity must be positive, got {}",
                input.quantity
            )));
        }

        let tenant_id = ctx.tenant_id();
        let branch_id = match input.branch_id {
            Some(id) => id,
            None => ctx.branch_id()?,
        };

        let mut tx = self.db.begin().await?;

        let batches =
            Self::lock_available(&mut tx, tenant_id, branch_id, &input.item_name, &input.unit)
                .await?;
        let plan = plan_fifo_deduction(&batches, input.quantity)?;
        plan.require_satisfied()?;
        Self::apply_plan(&mut tx, tenant_id, &plan).await?;

        tx.commit().await?;

        let cost = attribute_cost(&plan, None);
        Ok(DeductionOutcome {
            lines: plan.lines,
            consumed: plan.consumed,
            cost,
        })
    }

    /// Partial FIFO deduction inside a caller-owned transaction: consumes
    /// what is available and reports the shortfall together with the
    /// reference unit cost for estimating it. Only the waste valuation path
    /// uses this form.
    pub(crate) async fn deduct_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        tenant_id: Uuid,
        branch_id: Uuid,
        item_name: &str,
        unit: &str,
        quantity: Decimal,
    ) -> AppResult<(DeductionPlan, Option<Decimal>)> {
        let batches = Self::lock_available(tx, tenant_id, branch_id, item_name, unit).await?;
        let plan = plan_fifo_deduction(&batches, quantity)?;
        Self::apply_plan(tx, tenant_id, &plan).await?;

        let reference = if plan.is_satisfied() {
            None
        } else {
            match latest_unit_cost(&batches) {
                Some(cost) => Some(cost),
                None => {
                    Self::remembered_unit_cost(tx, tenant_id, branch_id, item_name, unit).await?
                }
            }
        };

        Ok((plan, reference))
    }

    /// Lock the available batches for an item in FIFO order.
    async fn lock_available(
        tx: &mut Transaction<'_, Postgres>,
        tenant_id: Uuid,
        branch_id: Uuid,
        item_name: &str,
        unit: &str,
    ) -> AppResult<Vec<InventoryBatch>> {
        let rows = sqlx::query_as::<_, BatchRow>(&format!(
            r#"
            SELECT {BATCH_COLUMNS}
            FROM inventory_batches
            WHERE tenant_id = $1 AND branch_id = $2 AND item_name = $3 AND unit = $4
              AND quantity > 0
            ORDER BY received_at ASC, id ASC
            FOR UPDATE
            "#
        ))
        .bind(tenant_id)
        .bind(branch_id)
        .bind(item_name)
        .bind(unit)
        .fetch_all(&mut **tx)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Apply a deduction plan to the locked rows. A batch drained to zero is
    /// deleted; zero rows are never retained.
    async fn apply_plan(
        tx: &mut Transaction<'_, Postgres>,
        tenant_id: Uuid,
        plan: &DeductionPlan,
    ) -> AppResult<()> {
        for line in &plan.lines {
            if line.remaining_in_batch.is_zero() {
                sqlx::query("DELETE FROM inventory_batches WHERE id = $1 AND tenant_id = $2")
                    .bind(line.batch_id)
                    .bind(tenant_id)
                    .execute(&mut **tx)
                    .await?;
            } else {
                sqlx::query(
                    "UPDATE inventory_batches SET quantity = $1 WHERE id = $2 AND tenant_id = $3",
                )
                .bind(line.remaining_in_batch)
                .bind(line.batch_id)
                .bind(tenant_id)
                .execute(&mut **tx)
                .await?;
            }
        }
        Ok(())
    }

    /// Last-received unit cost remembered on the stock-level row, for items
    /// whose batches have all been consumed and deleted.
    async fn remembered_unit_cost(
        tx: &mut Transaction<'_, Postgres>,
        tenant_id: Uuid,
        branch_id: Uuid,
        item_name: &str,
        unit: &str,
    ) -> AppResult<Option<Decimal>> {
        let cost = sqlx::query_scalar::<_, Option<Decimal>>(
            r#"
            SELECT last_unit_cost
            FROM stock_levels
            WHERE tenant_id = $1 AND branch_id = $2 AND item_name = $3 AND unit = $4
            ORDER BY last_received_at DESC NULLS LAST
            LIMIT 1
            "#,
        )
        .bind(tenant_id)
        .bind(branch_id)
        .bind(item_name)
        .bind(unit)
        .fetch_optional(&mut **tx)
        .await?
        .flatten();

        Ok(cost)
    }

    /// Direct edit of a batch (privileged actors and approved requests).
    /// An edit that sets quantity to zero deletes the batch and returns
    /// `None` — zero rows are never retained.
    pub async fn update_batch(
        &self,
        ctx: &TenantContext,
        batch_id: Uuid,
        patch: InventoryItemPatch,
    ) -> AppResult<Option<InventoryBatch>> {
        let mut tx = self.db.begin().await?;
        let updated = Self::update_batch_in_tx(&mut tx, ctx.tenant_id(), batch_id, &patch).await?;
        tx.commit().await?;
        Ok(updated)
    }

    /// Apply an inventory patch inside a caller-owned transaction (the
    /// approval workflow applies payloads this way, atomically with the
    /// status flip).
    pub(crate) async fn update_batch_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        tenant_id: Uuid,
        batch_id: Uuid,
        patch: &InventoryItemPatch,
    ) -> AppResult<Option<InventoryBatch>> {
        if let Some(quantity) = patch.quantity {
            if quantity < Decimal::ZERO {
                return Err(AppError::InvalidQuantity(format!(
                    "batch quantity cannot be negative, got {}",
                    quantity
                )));
            }
        }
        if let Some(unit_cost) = patch.unit_cost {
            if unit_cost < Decimal::ZERO {
                return Err(AppError::InvalidQuantity(format!(
                    "unit cost cannot be negative, got {}",
                    unit_cost
                )));
            }
        }

        if patch.quantity == Some(Decimal::ZERO) {
            let result =
                sqlx::query("DELETE FROM inventory_batches WHERE id = $1 AND tenant_id = $2")
                    .bind(batch_id)
                    .bind(tenant_id)
                    .execute(&mut **tx)
                    .await?;
            if result.rows_affected() == 0 {
                return Err(AppError::NotFound("Batch".to_string()));
            }
            return Ok(None);
        }

        let row = sqlx::query_as::<_, BatchRow>(&format!(
            r#"
            UPDATE inventory_batches
            SET quantity = COALESCE($1, quantity),
                unit_cost = COALESCE($2, unit_cost),
                category = COALESCE($3, category),
                expires_at = COALESCE($4, expires_at)
            WHERE id = $5 AND tenant_id = $6
            RETURNING {BATCH_COLUMNS}
            "#
        ))
        .bind(patch.quantity)
        .bind(patch.unit_cost)
        .bind(patch.category.as_deref())
        .bind(patch.expires_at)
        .bind(batch_id)
        .bind(tenant_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Batch".to_string()))?;

        Ok(Some(row.into()))
    }

    /// Remove a batch outright (privileged actors and approved requests)
    pub async fn delete_batch(&self, ctx: &TenantContext, batch_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;
        Self::delete_batch_in_tx(&mut tx, ctx.tenant_id(), batch_id).await?;
        tx.commit().await?;
        Ok(())
    }

    pub(crate) async fn delete_batch_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        tenant_id: Uuid,
        batch_id: Uuid,
    ) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM inventory_batches WHERE id = $1 AND tenant_id = $2")
            .bind(batch_id)
            .bind(tenant_id)
            .execute(&mut **tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Batch".to_string()));
        }

        Ok(())
    }

    /// Existence probe used by the approval workflow at submission time.
    pub(crate) async fn batch_exists(
        &self,
        ctx: &TenantContext,
        batch_id: Uuid,
    ) -> AppResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM inventory_batches WHERE id = $1 AND tenant_id = $2)",
        )
        .bind(batch_id)
        .bind(ctx.tenant_id())
        .fetch_one(&self.db)
        .await?;

        Ok(exists)
    }
}
