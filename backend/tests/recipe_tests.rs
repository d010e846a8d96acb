//! Recipe costing tests
//!
//! Weighted-average ingredient pricing over available batches and the
//! per-portion arithmetic, including the zero-portion configuration error.

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

use shared::models::{
    cost_recipe, validate_composition, weighted_average_unit_cost, InventoryBatch, Recipe,
    RecipeError, RecipeIngredient,
};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, d, 8, 0, 0).unwrap()
}

fn batch(id: u128, item: &str, quantity: &str, unit_cost: &str) -> InventoryBatch {
    InventoryBatch {
        id: Uuid::from_u128(id),
        tenant_id: Uuid::from_u128(1),
        branch_id: Uuid::from_u128(2),
        item_name: item.to_string(),
        category: "produce".to_string(),
        unit: "kg".to_string(),
        quantity: dec(quantity),
        unit_cost: dec(unit_cost),
        received_at: day(1),
        expires_at: None,
        created_at: day(1),
    }
}

fn ingredient(item: &str, quantity: &str) -> RecipeIngredient {
    RecipeIngredient {
        item_name: item.to_string(),
        quantity: dec(quantity),
        unit: "kg".to_string(),
    }
}

fn recipe(portion_size: &str, ingredients: Vec<RecipeIngredient>) -> Recipe {
    Recipe {
        id: Uuid::from_u128(77),
        tenant_id: Uuid::from_u128(1),
        name: "margherita".to_string(),
        portion_size: dec(portion_size),
        ingredients,
        created_at: day(1),
        updated_at: day(1),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// 100kg @ 20 and 50kg @ 30 average to 3500 / 150.
    #[test]
    fn test_weighted_average_cost() {
        let batches = vec![batch(1, "flour", "100", "20"), batch(2, "flour", "50", "30")];

        let avg = weighted_average_unit_cost(&batches).unwrap();

        assert_eq!(avg, dec("3500") / dec("150"));
        assert!(avg > dec("23.0") && avg < dec("24.0"));
    }

    #[test]
    fn test_weighted_average_none_when_empty() {
        assert!(weighted_average_unit_cost(&[]).is_none());
    }

    /// With every ingredient in stock at a uniform cost,
    /// cost-per-portion × portion size equals the total recipe cost.
    #[test]
    fn test_cost_per_portion_round_trip() {
        let recipe = recipe(
            "2",
            vec![ingredient("flour", "0.5"), ingredient("tomato", "0.3")],
        );
        let mut available = HashMap::new();
        available.insert("flour".to_string(), vec![batch(1, "flour", "10", "4")]);
        available.insert("tomato".to_string(), vec![batch(2, "tomato", "10", "4")]);

        let cost = cost_recipe(&recipe, &available).unwrap();

        // 0.5 * 4 + 0.3 * 4 = 3.2
        assert_eq!(cost.total_cost, dec("3.2"));
        assert_eq!(cost.cost_per_portion * cost.portion_size, cost.total_cost);
        assert!(cost.ingredients.iter().all(|i| i.available));
    }

    /// An ingredient with nothing in stock contributes zero and is flagged.
    #[test]
    fn test_unavailable_ingredient_contributes_zero() {
        let recipe = recipe(
            "1",
            vec![ingredient("flour", "0.5"), ingredient("saffron", "0.01")],
        );
        let mut available = HashMap::new();
        available.insert("flour".to_string(), vec![batch(1, "flour", "10", "4")]);

        let cost = cost_recipe(&recipe, &available).unwrap();

        assert_eq!(cost.total_cost, dec("2.0"));
        let saffron = cost
            .ingredients
            .iter()
            .find(|i| i.item_name == "saffron")
            .unwrap();
        assert!(!saffron.available);
        assert_eq!(saffron.line_cost, Decimal::ZERO);
    }

    /// Portion size of zero is a configuration error, not a division.
    #[test]
    fn test_zero_portion_size_rejected() {
        let recipe = recipe("0", vec![ingredient("flour", "0.5")]);

        assert!(matches!(
            cost_recipe(&recipe, &HashMap::new()),
            Err(RecipeError::InvalidPortionSize)
        ));
    }

    #[test]
    fn test_composition_validation() {
        assert_eq!(
            validate_composition(dec("0"), &[ingredient("flour", "1")]),
            Err(RecipeError::InvalidPortionSize)
        );
        assert_eq!(
            validate_composition(dec("1"), &[]),
            Err(RecipeError::NoIngredients)
        );
        assert_eq!(
            validate_composition(dec("1"), &[ingredient("flour", "0")]),
            Err(RecipeError::InvalidIngredientQuantity("flour".to_string()))
        );
        assert!(validate_composition(dec("1"), &[ingredient("flour", "1")]).is_ok());
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

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// The weighted average always lies between the cheapest and the
        /// most expensive batch.
        #[test]
        fn prop_weighted_average_bounded(
            entries in prop::collection::vec((quantity_strategy(), cost_strategy()), 1..10)
        ) {
            let batches: Vec<_> = entries
                .iter()
                .enumerate()
                .map(|(i, (q, c))| batch(i as u128 + 1, "flour", &q.to_string(), &c.to_string()))
                .collect();

            let avg = weighted_average_unit_cost(&batches).unwrap();
            let min = entries.iter().map(|(_, c)| *c).min().unwrap();
            let max = entries.iter().map(|(_, c)| *c).max().unwrap();

            prop_assert!(avg >= min);
            prop_assert!(avg <= max);
        }

        /// Total recipe cost is the sum of its ingredient line costs, and
        /// per-portion times portion size reproduces it.
        #[test]
        fn prop_total_is_sum_of_lines(
            quantities in prop::collection::vec(quantity_strategy(), 1..5),
            unit_cost in cost_strategy(),
            portion in (1i64..=100i64).prop_map(|n| Decimal::new(n, 1))
        ) {
            let ingredients: Vec<_> = quantities
                .iter()
                .enumerate()
                .map(|(i, q)| ingredient(&format!("item-{}", i), &q.to_string()))
                .collect();
            let recipe = recipe(&portion.to_string(), ingredients.clone());

            let mut available = HashMap::new();
            for (i, _) in ingredients.iter().enumerate() {
                let name = format!("item-{}", i);
                available.insert(
                    name.clone(),
                    vec![batch(i as u128 + 1, &name, "1000", &unit_cost.to_string())],
                );
            }

            let cost = cost_recipe(&recipe, &available).unwrap();

            let line_sum: Decimal = cost.ingredients.iter().map(|i| i.line_cost).sum();
            prop_assert_eq!(cost.total_cost, line_sum);

            // Division does not always terminate, so the round trip is
            // checked within minor-unit tolerance.
            let round_trip = cost.cost_per_portion * recipe.portion_size;
            prop_assert!((round_trip - cost.total_cost).abs() < Decimal::new(1, 6));
        }
    }
}
