//! Cost attribution tests
//!
//! True FIFO costing over deduction lines, the estimated-cost fallback for
//! shortfalls, and the explicit zero-cost case for items with no history.

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use shared::models::{attribute_cost, plan_fifo_deduction, CostBasis, InventoryBatch};
use shared::types::round_money;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, d, 8, 0, 0).unwrap()
}

fn batch(id: u128, received: DateTime<Utc>, quantity: &str, unit_cost: &str) -> InventoryBatch {
    InventoryBatch {
        id: Uuid::from_u128(id),
        tenant_id: Uuid::from_u128(1),
        branch_id: Uuid::from_u128(2),
        item_name: "flour".to_string(),
        category: "dry_goods".to_string(),
        unit: "kg".to_string(),
        quantity: dec(quantity),
        unit_cost: dec(unit_cost),
        received_at: received,
        expires_at: None,
        created_at: received,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// 5 units @ $2 plus 2 units @ $3 is exactly $16, flagged exact.
    #[test]
    fn test_exact_fifo_cost() {
        let batches = vec![batch(1, day(1), "5", "2"), batch(2, day(2), "5", "3")];
        let plan = plan_fifo_deduction(&batches, dec("7")).unwrap();

        let breakdown = attribute_cost(&plan, None);

        assert_eq!(breakdown.exact_cost, dec("16"));
        assert_eq!(breakdown.estimated_cost, Decimal::ZERO);
        assert_eq!(breakdown.total_cost, dec("16"));
        assert_eq!(breakdown.basis, CostBasis::Exact);
        assert!(breakdown.reference_unit_cost.is_none());
        assert!(breakdown.is_exact());
    }

    /// A shortfall of 5 priced at the reference cost of $3 adds an estimated
    /// $15, flagged so the caller can tell exact from estimated.
    #[test]
    fn test_shortfall_estimated_from_reference_cost() {
        let batches = vec![batch(1, day(1), "5", "2"), batch(2, day(2), "5", "3")];
        let plan = plan_fifo_deduction(&batches, dec("15")).unwrap();

        let breakdown = attribute_cost(&plan, Some(dec("3")));

        assert_eq!(breakdown.consumed_quantity, dec("10"));
        assert_eq!(breakdown.shortfall_quantity, dec("5"));
        assert_eq!(breakdown.exact_cost, dec("25"));
        assert_eq!(breakdown.estimated_cost, dec("15"));
        assert_eq!(breakdown.total_cost, dec("40"));
        assert_eq!(breakdown.basis, CostBasis::PartiallyEstimated);
        assert_eq!(breakdown.reference_unit_cost, Some(dec("3")));
        assert!(!breakdown.is_exact());
    }

    /// No batch of the item has ever existed: the remainder costs zero,
    /// explicitly, and the breakdown says why.
    #[test]
    fn test_no_history_costs_zero() {
        let plan = plan_fifo_deduction(&[], dec("4")).unwrap();

        let breakdown = attribute_cost(&plan, None);

        assert_eq!(breakdown.total_cost, Decimal::ZERO);
        assert_eq!(breakdown.shortfall_quantity, dec("4"));
        assert_eq!(breakdown.basis, CostBasis::EstimatedWithoutHistory);
        assert!(breakdown.reference_unit_cost.is_none());
    }

    /// A reference cost supplied without a shortfall is irrelevant and does
    /// not leak into the breakdown.
    #[test]
    fn test_reference_cost_ignored_when_satisfied() {
        let batches = vec![batch(1, day(1), "5", "2")];
        let plan = plan_fifo_deduction(&batches, dec("5")).unwrap();

        let breakdown = attribute_cost(&plan, Some(dec("99")));

        assert_eq!(breakdown.basis, CostBasis::Exact);
        assert!(breakdown.reference_unit_cost.is_none());
        assert_eq!(breakdown.total_cost, dec("10"));
    }

    #[test]
    fn test_round_money_to_minor_units() {
        assert_eq!(round_money(dec("2.005")), dec("2.01"));
        assert_eq!(round_money(dec("2.004")), dec("2.00"));
        assert_eq!(round_money(dec("-2.005")), dec("-2.01"));
        assert_eq!(round_money(dec("16")), dec("16.00"));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn quantity_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=10000i64).prop_map(|n| Decimal::new(n, 1))
    }

    fn cost_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=100000i64).prop_map(|n| Decimal::new(n, 2))
    }

    fn batches_strategy() -> impl Strategy<Value = Vec<InventoryBatch>> {
        prop::collection::vec((quantity_strategy(), cost_strategy(), 1u32..=28), 0..8).prop_map(
            |entries| {
                entries
                    .into_iter()
                    .enumerate()
                    .map(|(i, (quantity, cost, d))| {
                        batch(
                            i as u128 + 1,
                            day(d),
                            &quantity.to_string(),
                            &cost.to_string(),
                        )
                    })
                    .collect()
            },
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Cost conservation: exact cost is exactly the sum over lines of
        /// quantity × that batch's unit cost, with no drift.
        #[test]
        fn prop_exact_cost_matches_lines(
            batches in batches_strategy(),
            requested in quantity_strategy()
        ) {
            let plan = plan_fifo_deduction(&batches, requested).unwrap();
            let breakdown = attribute_cost(&plan, None);

            let expected: Decimal = plan
                .lines
                .iter()
                .map(|l| l.quantity_used * l.unit_cost)
                .sum();
            prop_assert_eq!(breakdown.exact_cost, expected);
        }

        /// Total is always the sum of the exact and estimated parts.
        #[test]
        fn prop_total_is_exact_plus_estimated(
            batches in batches_strategy(),
            requested in quantity_strategy(),
            reference in cost_strategy()
        ) {
            let plan = plan_fifo_deduction(&batches, requested).unwrap();
            let breakdown = attribute_cost(&plan, Some(reference));

            prop_assert_eq!(
                breakdown.total_cost,
                breakdown.exact_cost + breakdown.estimated_cost
            );
            prop_assert!(breakdown.total_cost >= Decimal::ZERO);
        }

        /// The estimated part is exactly shortfall × reference cost when a
        /// reference exists, and the basis flag matches the shortfall.
        #[test]
        fn prop_estimate_priced_at_reference(
            batches in batches_strategy(),
            requested in quantity_strategy(),
            reference in cost_strategy()
        ) {
            let plan = plan_fifo_deduction(&batches, requested).unwrap();
            let breakdown = attribute_cost(&plan, Some(reference));

            if plan.shortfall.is_zero() {
                prop_assert_eq!(breakdown.basis, CostBasis::Exact);
                prop_assert_eq!(breakdown.estimated_cost, Decimal::ZERO);
            } else {
                prop_assert_eq!(breakdown.basis, CostBasis::PartiallyEstimated);
                prop_assert_eq!(breakdown.estimated_cost, plan.shortfall * reference);
            }
        }
    }
}
