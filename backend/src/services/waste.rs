//! Waste valuation service
//!
//! A waste event's cost is computed here at creation time and is never
//! user-supplied. Raw waste deducts the wasted item from the ledger; product
//! waste expands the recipe composition and deducts every ingredient. Either
//! way the deductions and the event insert commit in one transaction. A
//! per-ingredient shortfall does not abort the event — waste must always be
//! recordable even under imperfect inventory tracking — it degrades to the
//! estimated-cost fallback and is flagged in the stored breakdown.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use std::str::FromStr;
use uuid::Uuid;

use shared::models::{
    attribute_cost, derive_tags, IngredientAttribution, Recipe, RecipeIngredient, WasteEvent,
    WasteKind, WasteSeverity,
};
use shared::types::{round_money, TenantContext};

use crate::error::{AppError, AppResult};
use crate::services::LedgerService;

/// Waste valuation service
#[derive(Clone)]
pub struct WasteService {
    db: PgPool,
}

/// Database row for a waste event
#[derive(Debug, FromRow)]
struct WasteEventRow {
    id: Uuid,
    tenant_id: Uuid,
    branch_id: Uuid,
    kind: String,
    item_name: Option<String>,
    unit: Option<String>,
    recipe_id: Option<Uuid>,
    quantity: Decimal,
    cost: Decimal,
    severity: String,
    preventable: bool,
    reason: String,
    tags: Vec<String>,
    attributions: serde_json::Value,
    created_by: Uuid,
    created_at: DateTime<Utc>,
}

impl WasteEventRow {
    fn into_event(self) -> AppResult<WasteEvent> {
        let kind = WasteKind::from_str(&self.kind).map_err(AppError::Internal)?;
        let severity = WasteSeverity::from_str(&self.severity).map_err(AppError::Internal)?;
        let attributions: Vec<IngredientAttribution> = serde_json::from_value(self.attributions)
            .map_err(|e| AppError::Internal(format!("Malformed waste attributions: {}", e)))?;
        Ok(WasteEvent {
            id: self.id,
            tenant_id: self.tenant_id,
            branch_id: self.branch_id,
            kind,
            item_name: self.item_name,
            unit: self.unit,
            recipe_id: self.recipe_id,
            quantity: self.quantity,
            cost: self.cost,
            severity,
            preventable: self.preventable,
            reason: self.reason,
            tags: self.tags,
            attributions,
            created_by: self.created_by,
            created_at: self.created_at,
        })
    }
}

const WASTE_COLUMNS: &str = "id, tenant_id, branch_id, kind, item_name, unit, recipe_id, \
                             quantity, cost, severity, preventable, reason, tags, attributions, \
                             created_by, created_at";

/// Input for recording a waste event
#[derive(Debug, Deserialize)]
pub struct RecordWasteInput {
    pub branch_id: Option<Uuid>,
    pub kind: WasteKind,
    /// Required for raw waste.
    pub item_name: Option<String>,
    pub unit: Option<String>,
    /// Required for product waste.
    pub recipe_id: Option<Uuid>,
    pub quantity: Decimal,
    pub severity: WasteSeverity,
    pub preventable: bool,
    pub reason: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Filters for listing waste events
#[derive(Debug, Default, Deserialize)]
pub struct WasteFilter {
    pub branch_id: Option<Uuid>,
    pub kind: Option<WasteKind>,
    pub severity: Option<WasteSeverity>,
}

impl WasteService {
    /// Create a new WasteService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record a waste event, deducting stock and computing its cost in one
    /// transaction.
    pub async fn record_event(
        &self,
        ctx: &TenantContext,
        user_id: Uuid,
        input: RecordWasteInput,
    ) -> AppResult<WasteEvent> {
        if input.quantity <= Decimal::ZERO {
            return Err(AppError::InvalidQuantity(format!(
                "wasted quantity must be positive, got {}",
                input.quantity
            )));
        }
        if input.reason.trim().is_empty() {
            return Err(AppError::Validation {
                field: "reason".to_string(),
                message: "Waste reason is required".to_string(),
            });
        }

        let tenant_id = ctx.tenant_id();
        let branch_id = match input.branch_id {
            Some(id) => id,
            None => ctx.branch_id()?,
        };

        let mut tx = self.db.begin().await?;

        let attributions = match input.kind {
            WasteKind::Raw => {
                let item_name = input.item_name.as_deref().ok_or_else(|| AppError::Validation {
                    field: "item_name".to_string(),
                    message: "Raw waste requires an item name".to_string(),
                })?;
                let unit = input.unit.as_deref().ok_or_else(|| AppError::Validation {
                    field: "unit".to_string(),
                    message: "Raw waste requires a unit of measure".to_string(),
                })?;

                let (plan, reference) = LedgerService::deduct_in_tx(
                    &mut tx,
                    tenant_id,
                    branch_id,
                    item_name,
                    unit,
                    input.quantity,
                )
                .await?;

                vec![IngredientAttribution {
                    item_name: item_name.to_string(),
                    unit: unit.to_string(),
                    breakdown: attribute_cost(&plan, reference),
                }]
            }
            WasteKind::Product => {
                let recipe_id = input.recipe_id.ok_or_else(|| AppError::Validation {
                    field: "recipe_id".to_string(),
                    message: "Product waste requires a recipe reference".to_string(),
                })?;
                let recipe = Self::load_recipe(&mut tx, tenant_id, recipe_id).await?;

                if recipe.portion_size <= Decimal::ZERO {
                    return Err(AppError::InvalidQuantity(
                        "recipe portion size must be positive".to_string(),
                    ));
                }
                let multiplier = input.quantity / recipe.portion_size;

                let mut attributions = Vec::with_capacity(recipe.ingredients.len());
                for ingredient in &recipe.ingredients {
                    let required = ingredient.quantity * multiplier;
                    let (plan, reference) = LedgerService::deduct_in_tx(
                        &mut tx,
                        tenant_id,
                        branch_id,
                        &ingredient.item_name,
                        &ingredient.unit,
                        required,
                    )
                    .await?;
                    attributions.push(IngredientAttribution {
                        item_name: ingredient.item_name.clone(),
                        unit: ingredient.unit.clone(),
                        breakdown: attribute_cost(&plan, reference),
                    });
                }
                attributions
            }
        };

        let cost = round_money(
            attributions
                .iter()
                .map(|a| a.breakdown.total_cost)
                .sum::<Decimal>(),
        );
        let tags = derive_tags(&input.reason, &input.tags, input.kind);
        let attributions_json = serde_json::to_value(&attributions)
            .map_err(|e| AppError::Internal(format!("Failed to encode attributions: {}", e)))?;

        let row = sqlx::query_as::<_, WasteEventRow>(&format!(
            r#"
            INSERT INTO waste_events
                (tenant_id, branch_id, kind, item_name, unit, recipe_id, quantity, cost,
                 severity, preventable, reason, tags, attributions, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {WASTE_COLUMNS}
            "#
        ))
        .bind(tenant_id)
        .bind(branch_id)
        .bind(input.kind.as_str())
        .bind(&input.item_name)
        .bind(&input.unit)
        .bind(input.recipe_id)
        .bind(input.quantity)
        .bind(cost)
        .bind(input.severity.as_str())
        .bind(input.preventable)
        .bind(&input.reason)
        .bind(&tags)
        .bind(attributions_json)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        row.into_event()
    }

    /// List waste events for the tenant, newest first
    pub async fn list_events(
        &self,
        ctx: &TenantContext,
        filter: WasteFilter,
    ) -> AppResult<Vec<WasteEvent>> {
        let rows = sqlx::query_as::<_, WasteEventRow>(&format!(
            r#"
            SELECT {WASTE_COLUMNS}
            FROM waste_events
            WHERE tenant_id = $1
              AND ($2::uuid IS NULL OR branch_id = $2)
              AND ($3::text IS NULL OR kind = $3)
              AND ($4::text IS NULL OR severity = $4)
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(ctx.tenant_id())
        .bind(filter.branch_id)
        .bind(filter.kind.map(|k| k.as_str()))
        .bind(filter.severity.map(|s| s.as_str()))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(WasteEventRow::into_event).collect()
    }

    /// Load a recipe inside the waste transaction.
    async fn load_recipe(
        tx: &mut Transaction<'_, Postgres>,
        tenant_id: Uuid,
        recipe_id: Uuid,
    ) -> AppResult<Recipe> {
        let row = sqlx::query_as::<_, (Uuid, String, Decimal, serde_json::Value, DateTime<Utc>, DateTime<Utc>)>(
            r#"
            SELECT id, name, portion_size, ingredients, created_at, updated_at
            FROM recipes
            WHERE id = $1 AND tenant_id = $2
            "#,
        )
        .bind(recipe_id)
        .bind(tenant_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Recipe".to_string()))?;

        let ingredients: Vec<RecipeIngredient> = serde_json::from_value(row.3)
            .map_err(|e| AppError::Internal(format!("Malformed recipe ingredients: {}", e)))?;

        Ok(Recipe {
            id: row.0,
            tenant_id,
            name: row.1,
            portion_size: row.2,
            ingredients,
            created_at: row.4,
            updated_at: row.5,
        })
    }
}
