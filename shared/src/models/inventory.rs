//! Inventory batch model and FIFO deduction planning
//!
//! The ledger stores inventory as discrete batches, each received at one time
//! with its own unit cost and expiry. Stock reduction always consumes the
//! oldest-received batches first; the planner here is pure so the FIFO
//! contract can be tested without a database. The backend ledger service
//! feeds it row-locked batches and applies the resulting plan in the same
//! transaction.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A discrete lot of inventory received at one time.
///
/// Quantity-on-hand only ever decreases once the batch exists; replenishment
/// is a new batch. A batch whose quantity reaches zero is deleted, never
/// retained as a zero row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryBatch {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub branch_id: Uuid,
    pub item_name: String,
    pub category: String,
    pub unit: String,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    pub received_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Per-item stock configuration, unique per
/// (tenant, branch, item, category, unit).
///
/// Besides the low-stock threshold it remembers the last-received unit cost,
/// which survives full consumption of every batch of the item and backs the
/// cost-estimation fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockLevel {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub branch_id: Uuid,
    pub item_name: String,
    pub category: String,
    pub unit: String,
    pub min_quantity: Decimal,
    pub is_active: bool,
    pub last_unit_cost: Option<Decimal>,
    pub last_received_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One batch's contribution to a deduction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeductionLine {
    pub batch_id: Uuid,
    pub quantity_used: Decimal,
    pub unit_cost: Decimal,
    /// Quantity left in the batch after this deduction. Zero means the batch
    /// is deleted when the plan is applied.
    pub remaining_in_batch: Decimal,
}

/// The computed consumption for a requested quantity, before it is applied.
///
/// `shortfall` is zero when the available batches cover the request. Callers
/// that require full coverage reject a non-zero shortfall before any write
/// happens; the waste valuation path instead applies the partial plan and
/// estimates the cost of the unmet remainder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeductionPlan {
    pub requested: Decimal,
    pub consumed: Decimal,
    pub shortfall: Decimal,
    pub lines: Vec<DeductionLine>,
}

impl DeductionPlan {
    pub fn is_satisfied(&self) -> bool {
        self.shortfall.is_zero()
    }

    /// Fail with `Insufficient` unless the plan covers the full request.
    pub fn require_satisfied(&self) -> Result<(), InventoryError> {
        if self.is_satisfied() {
            Ok(())
        } else {
            Err(InventoryError::Insufficient {
                requested: self.requested,
                available: self.consumed,
            })
        }
    }
}

/// Errors from deduction planning
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    #[error("requested quantity must be positive, got {0}")]
    InvalidQuantity(Decimal),

    #[error("insufficient inventory: requested {requested}, available {available}")]
    Insufficient {
        requested: Decimal,
        available: Decimal,
    },
}

/// Compute the FIFO consumption of `requested` across `batches`.
///
/// Batches are walked oldest received first, ties broken by batch id
/// ascending, so the plan is deterministic regardless of input order. Each
/// batch contributes `min(batch.quantity, remaining)`. The input is not
/// mutated; applying the plan is the caller's transactional concern.
pub fn plan_fifo_deduction(
    batches: &[InventoryBatch],
    requested: Decimal,
) -> Result<DeductionPlan, InventoryError> {
    if requested <= Decimal::ZERO {
        return Err(InventoryError::InvalidQuantity(requested));
    }

    let mut ordered: Vec<&InventoryBatch> =
        batches.iter().filter(|b| b.quantity > Decimal::ZERO).collect();
    ordered.sort_by(|a, b| {
        a.received_at
            .cmp(&b.received_at)
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut remaining = requested;
    let mut lines = Vec::new();

    for batch in ordered {
        if remaining.is_zero() {
            break;
        }
        let used = batch.quantity.min(remaining);
        remaining -= used;
        lines.push(DeductionLine {
            batch_id: batch.id,
            quantity_used: used,
            unit_cost: batch.unit_cost,
            remaining_in_batch: batch.quantity - used,
        });
    }

    Ok(DeductionPlan {
        requested,
        consumed: requested - remaining,
        shortfall: remaining,
        lines,
    })
}

/// Most recently received unit cost among the given batches, if any.
///
/// Used as the first tier of the cost-estimation fallback; the stock-level
/// row's remembered cost is the second tier once every batch is gone.
pub fn latest_unit_cost(batches: &[InventoryBatch]) -> Option<Decimal> {
    batches
        .iter()
        .max_by(|a, b| {
            a.received_at
                .cmp(&b.received_at)
                .then_with(|| a.id.cmp(&b.id))
        })
        .map(|b| b.unit_cost)
}
