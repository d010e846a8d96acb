//! HTTP handlers for the Restaurant Operations Platform

pub mod approval;
pub mod auth;
pub mod health;
pub mod inventory;
pub mod recipe;
pub mod stock_level;
pub mod tenant;
pub mod waste;

pub use approval::*;
pub use auth::*;
pub use health::*;
pub use inventory::*;
pub use recipe::*;
pub use stock_level::*;
pub use tenant::*;
pub use waste::*;
