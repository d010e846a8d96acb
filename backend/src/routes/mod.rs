//! Route definitions for the Restaurant Operations Platform

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (public)
        .nest("/auth", auth_routes())
        // Protected routes - tenant and branch registry
        .nest("/tenant", tenant_routes())
        // Protected routes - inventory ledger
        .nest("/inventory", inventory_routes())
        // Protected routes - recipes and costing
        .nest("/recipes", recipe_routes())
        // Protected routes - waste events
        .nest("/waste", waste_routes())
        // Protected routes - approval workflow
        .nest("/approvals", approval_routes())
        // Protected routes - stock-level configuration
        .nest("/stock-levels", stock_level_routes())
}

/// Authentication routes (public)
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/refresh", post(handlers::refresh))
}

/// Tenant and branch registry routes
fn tenant_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::get_tenant))
        .route("/branches", get(handlers::list_branches))
        .route("/branches", post(handlers::create_branch))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Inventory ledger routes
fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/batches", post(handlers::add_batch))
        .route("/batches", get(handlers::list_batches))
        .route("/batches/:id", get(handlers::get_batch))
        .route("/batches/:id", put(handlers::update_batch))
        .route("/batches/:id", delete(handlers::delete_batch))
        .route("/available", get(handlers::query_available))
        .route("/deduct", post(handlers::deduct))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Recipe routes
fn recipe_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_recipe))
        .route("/", get(handlers::list_recipes))
        .route("/:id", get(handlers::get_recipe))
        .route("/:id", delete(handlers::delete_recipe))
        .route("/:id/cost", get(handlers::calculate_recipe_cost))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Waste event routes
fn waste_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::record_waste))
        .route("/", get(handlers::list_waste))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Approval workflow routes
fn approval_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::submit_approval))
        .route("/", get(handlers::list_approvals))
        .route("/:id", get(handlers::get_approval))
        .route("/:id/review", post(handlers::review_approval))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Stock-level configuration routes
fn stock_level_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_stock_level))
        .route("/", get(handlers::list_stock_levels))
        .route("/:id", put(handlers::update_stock_level))
        .route("/:id", delete(handlers::delete_stock_level))
        .route("/low", get(handlers::low_stock))
        .route_layer(middleware::from_fn(auth_middleware))
}
