//! Validation utilities shared between the backend services and input DTOs

use rust_decimal::Decimal;
use validator::ValidationError;

/// Validate that a quantity is strictly positive (validator-derive custom).
pub fn positive_quantity(quantity: &Decimal) -> Result<(), ValidationError> {
    if *quantity <= Decimal::ZERO {
        return Err(ValidationError::new("quantity_not_positive"));
    }
    Ok(())
}

/// Validate that a unit cost is non-negative (validator-derive custom).
pub fn non_negative_cost(cost: &Decimal) -> Result<(), ValidationError> {
    if *cost < Decimal::ZERO {
        return Err(ValidationError::new("cost_negative"));
    }
    Ok(())
}

/// Validate a recipe portion size. A portion size of zero is a configuration
/// error, never silently divided through.
pub fn validate_portion_size(portion_size: Decimal) -> Result<(), &'static str> {
    if portion_size <= Decimal::ZERO {
        return Err("Portion size must be positive");
    }
    Ok(())
}

/// Validate that a unit-of-measure string is usable as a batch lookup key.
pub fn validate_unit(unit: &str) -> Result<(), &'static str> {
    if unit.trim().is_empty() {
        return Err("Unit of measure is required");
    }
    Ok(())
}
