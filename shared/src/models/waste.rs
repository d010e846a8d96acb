//! Waste event model and tag derivation
//!
//! A waste event's cost is computed at creation time from the ledger and the
//! cost attribution engine — never user-supplied. Tag derivation is a pure
//! function of the reason text, the user tags and the waste kind, so the same
//! input always produces the same tag set in the same order.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use super::costing::CostBreakdown;

/// What kind of stock a waste event destroyed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WasteKind {
    /// A raw material straight off the ledger.
    Raw,
    /// A finished recipe item; ingredient consumption is derived from the
    /// recipe composition.
    Product,
}

impl WasteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WasteKind::Raw => "raw",
            WasteKind::Product => "product",
        }
    }
}

impl FromStr for WasteKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "raw" => Ok(WasteKind::Raw),
            "product" => Ok(WasteKind::Product),
            other => Err(format!("unknown waste kind: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WasteSeverity {
    Low,
    Medium,
    High,
}

impl WasteSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            WasteSeverity::Low => "low",
            WasteSeverity::Medium => "medium",
            WasteSeverity::High => "high",
        }
    }
}

impl FromStr for WasteSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(WasteSeverity::Low),
            "medium" => Ok(WasteSeverity::Medium),
            "high" => Ok(WasteSeverity::High),
            other => Err(format!("unknown waste severity: {}", other)),
        }
    }
}

/// Cost attribution for one ingredient consumed by a waste event. A raw
/// waste event has exactly one; a product waste event has one per recipe
/// ingredient, each separately flagged exact or estimated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngredientAttribution {
    pub item_name: String,
    pub unit: String,
    pub breakdown: CostBreakdown,
}

/// A recorded waste event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WasteEvent {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub branch_id: Uuid,
    pub kind: WasteKind,
    /// Set for raw waste.
    pub item_name: Option<String>,
    pub unit: Option<String>,
    /// Set for product waste.
    pub recipe_id: Option<Uuid>,
    pub quantity: Decimal,
    /// Computed cost in currency minor-unit precision, ≥ 0.
    pub cost: Decimal,
    pub severity: WasteSeverity,
    pub preventable: bool,
    pub reason: String,
    pub tags: Vec<String>,
    pub attributions: Vec<IngredientAttribution>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Fixed classification taxonomy, scanned in this order. Keywords are
/// matched case-insensitively as substrings of the reason text.
const TAG_TAXONOMY: &[(&str, &[&str])] = &[
    (
        "expiry_spoilage",
        &["expir", "spoil", "rotten", "mold", "past date", "gone off"],
    ),
    (
        "cooking_error",
        &["burn", "overcook", "undercook", "cooking error", "wrong prep", "misfire"],
    ),
    (
        "contamination",
        &["contaminat", "cross contact", "foreign object", "allergen"],
    ),
    (
        "over_ordering",
        &["over order", "over-order", "overorder", "excess", "surplus", "overstock"],
    ),
    ("damage", &["damag", "broken", "crushed", "dropped", "spill"]),
    (
        "customer_related",
        &["customer", "complaint", "returned", "sent back", "refus"],
    ),
];

/// Derive the tag set for a waste event: taxonomy tags first (taxonomy
/// order), then user tags (input order), then the waste kind, with
/// case-insensitive duplicates removed keeping the first occurrence.
pub fn derive_tags(reason: &str, user_tags: &[String], kind: WasteKind) -> Vec<String> {
    let reason_lower = reason.to_lowercase();
    let mut tags: Vec<String> = Vec::new();
    let mut seen: Vec<String> = Vec::new();

    let mut push = |tag: &str, tags: &mut Vec<String>, seen: &mut Vec<String>| {
        let key = tag.to_lowercase();
        if !key.is_empty() && !seen.contains(&key) {
            seen.push(key);
            tags.push(tag.to_string());
        }
    };

    for (tag, keywords) in TAG_TAXONOMY {
        if keywords.iter().any(|kw| reason_lower.contains(kw)) {
            push(tag, &mut tags, &mut seen);
        }
    }

    for tag in user_tags {
        push(tag.trim(), &mut tags, &mut seen);
    }

    push(kind.as_str(), &mut tags, &mut seen);

    tags
}
