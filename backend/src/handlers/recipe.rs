//! HTTP handlers for recipe management and costing

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::models::{Recipe, RecipeCost};

use crate::error::AppResult;
use crate::middleware::auth::require_direct_mutation;
use crate::middleware::CurrentUser;
use crate::services::recipe::CreateRecipeInput;
use crate::services::RecipeService;
use crate::AppState;

#[derive(Deserialize)]
pub struct CostQuery {
    pub branch_id: Option<Uuid>,
}

/// Create a recipe
pub async fn create_recipe(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateRecipeInput>,
) -> AppResult<Json<Recipe>> {
    require_direct_mutation(&current_user.0)?;
    let ctx = current_user.0.context()?;
    let service = RecipeService::new(state.db);
    let recipe = service.create_recipe(&ctx, input).await?;
    Ok(Json(recipe))
}

/// List recipes for the tenant
pub async fn list_recipes(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<Recipe>>> {
    let ctx = current_user.0.context()?;
    let service = RecipeService::new(state.db);
    let recipes = service.list_recipes(&ctx).await?;
    Ok(Json(recipes))
}

/// Get a recipe
pub async fn get_recipe(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(recipe_id): Path<Uuid>,
) -> AppResult<Json<Recipe>> {
    let ctx = current_user.0.context()?;
    let service = RecipeService::new(state.db);
    let recipe = service.get_recipe(&ctx, recipe_id).await?;
    Ok(Json(recipe))
}

/// Delete a recipe
pub async fn delete_recipe(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(recipe_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require_direct_mutation(&current_user.0)?;
    let ctx = current_user.0.context()?;
    let service = RecipeService::new(state.db);
    service.delete_recipe(&ctx, recipe_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Advisory cost of a recipe against current inventory
pub async fn calculate_recipe_cost(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(recipe_id): Path<Uuid>,
    Query(query): Query<CostQuery>,
) -> AppResult<Json<RecipeCost>> {
    let ctx = current_user.0.context()?;
    let service = RecipeService::new(state.db);
    let cost = service
        .calculate_cost(&ctx, recipe_id, query.branch_id)
        .await?;
    Ok(Json(cost))
}
