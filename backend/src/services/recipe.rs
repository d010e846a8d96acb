//! Recipe management and advisory recipe costing
//!
//! Costing reads current batch availability through the ledger and prices
//! each ingredient at its weighted-average unit cost; it never mutates
//! inventory. Exact FIFO pricing happens only at actual consumption time
//! (waste, production) through the deduction path.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use shared::models::{cost_recipe, validate_composition, Recipe, RecipeCost, RecipeIngredient};
use shared::types::TenantContext;

use crate::error::{AppError, AppResult};
use crate::services::LedgerService;

/// Recipe service
#[derive(Clone)]
pub struct RecipeService {
    db: PgPool,
}

/// Database row for a recipe; the ingredient list is a JSONB document.
#[derive(Debug, FromRow)]
struct RecipeRow {
    id: Uuid,
    tenant_id: Uuid,
    name: String,
    portion_size: Decimal,
    ingredients: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RecipeRow {
    fn into_recipe(self) -> AppResult<Recipe> {
        let ingredients: Vec<RecipeIngredient> = serde_json::from_value(self.ingredients)
            .map_err(|e| AppError::Internal(format!("Malformed recipe ingredients: {}", e)))?;
        Ok(Recipe {
            id: self.id,
            tenant_id: self.tenant_id,
            name: self.name,
            portion_size: self.portion_size,
            ingredients,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Input for creating a recipe
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRecipeInput {
    #[validate(length(min = 1, message = "Product name is required"))]
    pub name: String,
    #[validate(custom = "shared::validation::positive_quantity")]
    pub portion_size: Decimal,
    pub ingredients: Vec<RecipeIngredient>,
}

impl RecipeService {
    /// Create a new RecipeService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a recipe. Composition is validated up front: positive portion
    /// size, at least one ingredient, positive ingredient quantities.
    pub async fn create_recipe(
        &self,
        ctx: &TenantContext,
        input: CreateRecipeInput,
    ) -> AppResult<Recipe> {
        input.validate()?;
        validate_composition(input.portion_size, &input.ingredients)?;

        let ingredients = serde_json::to_value(&input.ingredients)
            .map_err(|e| AppError::Internal(format!("Failed to encode ingredients: {}", e)))?;

        let row = sqlx::query_as::<_, RecipeRow>(
            r#"
            INSERT INTO recipes (tenant_id, name, portion_size, ingredients)
            VALUES ($1, $2, $3, $4)
            RETURNING id, tenant_id, name, portion_size, ingredients, created_at, updated_at
            "#,
        )
        .bind(ctx.tenant_id())
        .bind(&input.name)
        .bind(input.portion_size)
        .bind(ingredients)
        .fetch_one(&self.db)
        .await?;

        row.into_recipe()
    }

    /// List recipes for the tenant
    pub async fn list_recipes(&self, ctx: &TenantContext) -> AppResult<Vec<Recipe>> {
        let rows = sqlx::query_as::<_, RecipeRow>(
            r#"
            SELECT id, tenant_id, name, portion_size, ingredients, created_at, updated_at
            FROM recipes
            WHERE tenant_id = $1
            ORDER BY name ASC
            "#,
        )
        .bind(ctx.tenant_id())
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(RecipeRow::into_recipe).collect()
    }

    /// Get a recipe by id
    pub async fn get_recipe(&self, ctx: &TenantContext, recipe_id: Uuid) -> AppResult<Recipe> {
        let row = sqlx::query_as::<_, RecipeRow>(
            r#"
            SELECT id, tenant_id, name, portion_size, ingredients, created_at, updated_at
            FROM recipes
            WHERE id = $1 AND tenant_id = $2
            "#,
        )
        .bind(recipe_id)
        .bind(ctx.tenant_id())
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Recipe".to_string()))?;

        row.into_recipe()
    }

    /// Delete a recipe
    pub async fn delete_recipe(&self, ctx: &TenantContext, recipe_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = $1 AND tenant_id = $2")
            .bind(recipe_id)
            .bind(ctx.tenant_id())
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Recipe".to_string()));
        }

        Ok(())
    }

    /// Cost a recipe against current availability. A `None` branch prices
    /// against the whole tenant's stock; this is a read and takes no locks.
    pub async fn calculate_cost(
        &self,
        ctx: &TenantContext,
        recipe_id: Uuid,
        branch_id: Option<Uuid>,
    ) -> AppResult<RecipeCost> {
        let recipe = self.get_recipe(ctx, recipe_id).await?;

        let ledger = LedgerService::new(self.db.clone());
        let mut available = HashMap::new();
        for ingredient in &recipe.ingredients {
            if available.contains_key(&ingredient.item_name) {
                continue;
            }
            let batches = ledger
                .query_available(ctx, &ingredient.item_name, &ingredient.unit, branch_id)
                .await?;
            available.insert(ingredient.item_name.clone(), batches);
        }

        Ok(cost_recipe(&recipe, &available)?)
    }
}
