//! Recipe models and advisory recipe costing
//!
//! Recipe costing is a read: it prices each ingredient at the weighted
//! average unit cost of the currently available batches instead of running a
//! FIFO deduction. The approximation is deliberate — costing is advisory and
//! pre-production, and must not mutate inventory. Actual consumption (waste,
//! production) is priced exactly through the deduction path.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::inventory::InventoryBatch;

/// One ingredient of a recipe. Quantity is per portion-size unit of the
/// finished product; the unit must match the unit of the matching inventory
/// batches for cost lookups to succeed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub item_name: String,
    pub quantity: Decimal,
    pub unit: String,
}

/// A finished product with its ordered ingredient list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub portion_size: Decimal,
    pub ingredients: Vec<RecipeIngredient>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Cost contribution of one ingredient in a recipe costing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngredientCost {
    pub item_name: String,
    pub unit: String,
    pub quantity: Decimal,
    /// Weighted average across the currently available batches; zero when
    /// nothing is in stock.
    pub unit_cost: Decimal,
    pub line_cost: Decimal,
    /// False when no batch of this ingredient is currently available; the
    /// ingredient then contributes zero cost and the figure is advisory only.
    pub available: bool,
}

/// Result of costing a recipe against current inventory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeCost {
    pub recipe_id: Uuid,
    pub portion_size: Decimal,
    pub total_cost: Decimal,
    pub cost_per_portion: Decimal,
    pub ingredients: Vec<IngredientCost>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecipeError {
    #[error("portion size must be positive")]
    InvalidPortionSize,

    #[error("ingredient quantity must be positive: {0}")]
    InvalidIngredientQuantity(String),

    #[error("recipe must have at least one ingredient")]
    NoIngredients,
}

/// Validate a recipe's composition at creation time.
pub fn validate_composition(
    portion_size: Decimal,
    ingredients: &[RecipeIngredient],
) -> Result<(), RecipeError> {
    if portion_size <= Decimal::ZERO {
        return Err(RecipeError::InvalidPortionSize);
    }
    if ingredients.is_empty() {
        return Err(RecipeError::NoIngredients);
    }
    for ingredient in ingredients {
        if ingredient.quantity <= Decimal::ZERO {
            return Err(RecipeError::InvalidIngredientQuantity(
                ingredient.item_name.clone(),
            ));
        }
    }
    Ok(())
}

/// Weighted average unit cost across the available batches of one item:
/// Σ(quantity × unit cost) / Σ(quantity). `None` when nothing is available.
pub fn weighted_average_unit_cost(batches: &[InventoryBatch]) -> Option<Decimal> {
    let total_quantity: Decimal = batches.iter().map(|b| b.quantity).sum();
    if total_quantity <= Decimal::ZERO {
        return None;
    }
    let total_value: Decimal = batches.iter().map(|b| b.quantity * b.unit_cost).sum();
    Some(total_value / total_quantity)
}

/// Cost a recipe against a snapshot of available batches keyed by item name.
///
/// Division by portion size happens only after the size has been validated;
/// a portion size of zero is a configuration error, not a silent division.
pub fn cost_recipe(
    recipe: &Recipe,
    available: &HashMap<String, Vec<InventoryBatch>>,
) -> Result<RecipeCost, RecipeError> {
    if recipe.portion_size <= Decimal::ZERO {
        return Err(RecipeError::InvalidPortionSize);
    }

    let mut ingredients = Vec::with_capacity(recipe.ingredients.len());
    let mut total_cost = Decimal::ZERO;

    for ingredient in &recipe.ingredients {
        let batches = available
            .get(&ingredient.item_name)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        let unit_cost = weighted_average_unit_cost(batches);
        let line_cost = unit_cost.unwrap_or(Decimal::ZERO) * ingredient.quantity;
        total_cost += line_cost;

        ingredients.push(IngredientCost {
            item_name: ingredient.item_name.clone(),
            unit: ingredient.unit.clone(),
            quantity: ingredient.quantity,
            unit_cost: unit_cost.unwrap_or(Decimal::ZERO),
            line_cost,
            available: unit_cost.is_some(),
        });
    }

    Ok(RecipeCost {
        recipe_id: recipe.id,
        portion_size: recipe.portion_size,
        total_cost,
        cost_per_portion: total_cost / recipe.portion_size,
        ingredients,
    })
}
