//! Inventory ledger tests
//!
//! Covers the FIFO deduction contract:
//! - oldest-received batches are consumed first, ties broken by batch id
//! - quantity is conserved across the returned deduction lines
//! - a shortfall is reported without mutating anything

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use shared::models::{latest_unit_cost, plan_fifo_deduction, InventoryBatch, InventoryError};

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
        item_name: "tomato".to_string(),
        category: "produce".to_string(),
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

    /// B1(day1, qty5, $2) then B2(day2, qty5, $3); deducting 7 consumes all
    /// of B1 and 2 units of B2.
    #[test]
    fn test_fifo_consumes_oldest_first() {
        let batches = vec![batch(1, day(1), "5", "2"), batch(2, day(2), "5", "3")];

        let plan = plan_fifo_deduction(&batches, dec("7")).unwrap();

        assert!(plan.is_satisfied());
        assert_eq!(plan.consumed, dec("7"));
        assert_eq!(plan.lines.len(), 2);

        assert_eq!(plan.lines[0].batch_id, Uuid::from_u128(1));
        assert_eq!(plan.lines[0].quantity_used, dec("5"));
        assert_eq!(plan.lines[0].remaining_in_batch, Decimal::ZERO);

        assert_eq!(plan.lines[1].batch_id, Uuid::from_u128(2));
        assert_eq!(plan.lines[1].quantity_used, dec("2"));
        assert_eq!(plan.lines[1].remaining_in_batch, dec("3"));
    }

    /// The plan is identical regardless of the order batches arrive in.
    #[test]
    fn test_fifo_independent_of_input_order() {
        let forward = vec![batch(1, day(1), "5", "2"), batch(2, day(2), "5", "3")];
        let reversed: Vec<_> = forward.iter().rev().cloned().collect();

        let plan_a = plan_fifo_deduction(&forward, dec("7")).unwrap();
        let plan_b = plan_fifo_deduction(&reversed, dec("7")).unwrap();

        assert_eq!(plan_a.lines, plan_b.lines);
    }

    /// Same received timestamp: lower batch id wins.
    #[test]
    fn test_fifo_tie_broken_by_batch_id() {
        let batches = vec![batch(9, day(1), "4", "2"), batch(3, day(1), "4", "3")];

        let plan = plan_fifo_deduction(&batches, dec("5")).unwrap();

        assert_eq!(plan.lines[0].batch_id, Uuid::from_u128(3));
        assert_eq!(plan.lines[0].quantity_used, dec("4"));
        assert_eq!(plan.lines[1].batch_id, Uuid::from_u128(9));
        assert_eq!(plan.lines[1].quantity_used, dec("1"));
    }

    /// Deducting 20 from 10 available reports a shortfall of 10; the strict
    /// guard turns it into an error and the input batches are untouched.
    #[test]
    fn test_insufficient_inventory() {
        let batches = vec![batch(1, day(1), "5", "2"), batch(2, day(2), "5", "3")];
        let before = batches.clone();

        let plan = plan_fifo_deduction(&batches, dec("20")).unwrap();

        assert_eq!(plan.consumed, dec("10"));
        assert_eq!(plan.shortfall, dec("10"));
        assert_eq!(
            plan.require_satisfied(),
            Err(InventoryError::Insufficient {
                requested: dec("20"),
                available: dec("10"),
            })
        );

        // Planning never mutates the batches it reads.
        for (a, b) in batches.iter().zip(before.iter()) {
            assert_eq!(a.quantity, b.quantity);
        }
    }

    #[test]
    fn test_exact_consumption_empties_every_batch() {
        let batches = vec![batch(1, day(1), "5", "2"), batch(2, day(2), "5", "3")];

        let plan = plan_fifo_deduction(&batches, dec("10")).unwrap();

        assert!(plan.is_satisfied());
        assert!(plan.lines.iter().all(|l| l.remaining_in_batch.is_zero()));
    }

    #[test]
    fn test_rejects_non_positive_quantity() {
        let batches = vec![batch(1, day(1), "5", "2")];

        assert_eq!(
            plan_fifo_deduction(&batches, Decimal::ZERO),
            Err(InventoryError::InvalidQuantity(Decimal::ZERO))
        );
        assert_eq!(
            plan_fifo_deduction(&batches, dec("-3")),
            Err(InventoryError::InvalidQuantity(dec("-3")))
        );
    }

    #[test]
    fn test_no_batches_means_full_shortfall() {
        let plan = plan_fifo_deduction(&[], dec("4")).unwrap();

        assert_eq!(plan.consumed, Decimal::ZERO);
        assert_eq!(plan.shortfall, dec("4"));
        assert!(plan.lines.is_empty());
    }

    #[test]
    fn test_latest_unit_cost_picks_most_recent() {
        let batches = vec![
            batch(1, day(1), "5", "2"),
            batch(2, day(9), "5", "7"),
            batch(3, day(4), "5", "3"),
        ];

        assert_eq!(latest_unit_cost(&batches), Some(dec("7")));
        assert_eq!(latest_unit_cost(&[]), None);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for generating valid quantities (positive decimals)
    fn quantity_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=10000i64).prop_map(|n| Decimal::new(n, 1)) // 0.1 to 1000.0
    }

    /// Strategy for generating valid unit costs
    fn cost_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=100000i64).prop_map(|n| Decimal::new(n, 2)) // 0.01 to 1000.00
    }

    /// Strategy for a shelf of batches with distinct ids
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

        /// consumed + shortfall always equals the requested quantity.
        #[test]
        fn prop_consumed_plus_shortfall_is_requested(
            batches in batches_strategy(),
            requested in quantity_strategy()
        ) {
            let plan = plan_fifo_deduction(&batches, requested).unwrap();
            prop_assert_eq!(plan.consumed + plan.shortfall, requested);
        }

        /// Quantity conservation: the deduction lines sum to the consumed
        /// amount, and to the full request when it was satisfied.
        #[test]
        fn prop_lines_conserve_quantity(
            batches in batches_strategy(),
            requested in quantity_strategy()
        ) {
            let plan = plan_fifo_deduction(&batches, requested).unwrap();
            let used: Decimal = plan.lines.iter().map(|l| l.quantity_used).sum();
            prop_assert_eq!(used, plan.consumed);
            if plan.is_satisfied() {
                prop_assert_eq!(used, requested);
            }
        }

        /// No line draws more than its batch held, every line draws
        /// something, and remaining is the difference.
        #[test]
        fn prop_lines_respect_batch_bounds(
            batches in batches_strategy(),
            requested in quantity_strategy()
        ) {
            let plan = plan_fifo_deduction(&batches, requested).unwrap();
            for line in &plan.lines {
                let source = batches.iter().find(|b| b.id == line.batch_id).unwrap();
                prop_assert!(line.quantity_used > Decimal::ZERO);
                prop_assert!(line.quantity_used <= source.quantity);
                prop_assert_eq!(line.remaining_in_batch, source.quantity - line.quantity_used);
            }
        }

        /// Lines come out in FIFO order and only the last consumed batch may
        /// be left partially drained.
        #[test]
        fn prop_lines_in_fifo_order(
            batches in batches_strategy(),
            requested in quantity_strategy()
        ) {
            let plan = plan_fifo_deduction(&batches, requested).unwrap();

            let received: Vec<_> = plan
                .lines
                .iter()
                .map(|l| {
                    let b = batches.iter().find(|b| b.id == l.batch_id).unwrap();
                    (b.received_at, b.id)
                })
                .collect();
            let mut sorted = received.clone();
            sorted.sort();
            prop_assert_eq!(&received, &sorted);

            for line in plan.lines.iter().rev().skip(1) {
                prop_assert!(line.remaining_in_batch.is_zero());
            }
        }

        /// Planning twice over the same shelf yields the identical plan.
        #[test]
        fn prop_planning_is_deterministic(
            batches in batches_strategy(),
            requested in quantity_strategy()
        ) {
            let a = plan_fifo_deduction(&batches, requested).unwrap();
            let b = plan_fifo_deduction(&batches, requested).unwrap();
            prop_assert_eq!(a.lines, b.lines);
            prop_assert_eq!(a.shortfall, b.shortfall);
        }
    }
}
