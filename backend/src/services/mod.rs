//! Business logic services for the Restaurant Operations Platform
//!
//! Every tenant-scoped service method takes a `TenantContext` as its first
//! argument; there is no other way to reach tenant data.

pub mod approval;
pub mod auth;
pub mod inventory;
pub mod recipe;
pub mod stock_level;
pub mod tenant;
pub mod waste;

pub use approval::ApprovalService;
pub use auth::AuthService;
pub use inventory::LedgerService;
pub use recipe::RecipeService;
pub use stock_level::StockLevelService;
pub use tenant::TenantService;
pub use waste::WasteService;
