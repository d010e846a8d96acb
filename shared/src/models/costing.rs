//! Cost attribution over FIFO deduction results
//!
//! Because every deduction line carries the unit cost of the specific batch
//! it drew from, the cost of a satisfied deduction is exact (true FIFO
//! costing, not a weighted average). When the ledger could not cover the full
//! request, the unmet remainder is priced from the most recently received
//! unit cost known for the item and flagged as an estimate so callers can
//! always tell exact from estimated cost.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::inventory::DeductionPlan;

/// How the total cost in a [`CostBreakdown`] was derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostBasis {
    /// The full request was covered by batch consumption.
    Exact,
    /// Part of the request was priced from the last known unit cost.
    PartiallyEstimated,
    /// A shortfall existed and no cost history exists for the item at all;
    /// the remainder was priced at zero.
    EstimatedWithoutHistory,
}

/// Monetary attribution of a deduction, exact and estimated parts separated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub requested_quantity: Decimal,
    pub consumed_quantity: Decimal,
    pub shortfall_quantity: Decimal,
    /// Σ(quantity used × batch unit cost) over the consumed batches.
    pub exact_cost: Decimal,
    /// Shortfall × reference unit cost (zero when no history exists).
    pub estimated_cost: Decimal,
    pub total_cost: Decimal,
    /// Unit cost the estimate was priced at, when one was available.
    pub reference_unit_cost: Option<Decimal>,
    pub basis: CostBasis,
}

impl CostBreakdown {
    pub fn is_exact(&self) -> bool {
        matches!(self.basis, CostBasis::Exact)
    }
}

/// Price a deduction plan.
///
/// `reference_unit_cost` is the most recently received unit cost known for
/// the item (live batches first, then the stock-level row's remembered cost).
/// `None` means no batch of the item has ever existed; a shortfall then
/// costs zero, explicitly, and is flagged as such rather than treated as an
/// error.
pub fn attribute_cost(
    plan: &DeductionPlan,
    reference_unit_cost: Option<Decimal>,
) -> CostBreakdown {
    let exact_cost: Decimal = plan
        .lines
        .iter()
        .map(|line| line.quantity_used * line.unit_cost)
        .sum();

    let (estimated_cost, basis) = if plan.shortfall.is_zero() {
        (Decimal::ZERO, CostBasis::Exact)
    } else {
        match reference_unit_cost {
            Some(cost) => (plan.shortfall * cost, CostBasis::PartiallyEstimated),
            None => (Decimal::ZERO, CostBasis::EstimatedWithoutHistory),
        }
    };

    CostBreakdown {
        requested_quantity: plan.requested,
        consumed_quantity: plan.consumed,
        shortfall_quantity: plan.shortfall,
        exact_cost,
        estimated_cost,
        total_cost: exact_cost + estimated_cost,
        reference_unit_cost: if plan.shortfall.is_zero() {
            None
        } else {
            reference_unit_cost
        },
        basis,
    }
}
