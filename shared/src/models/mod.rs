//! Data models for the Restaurant Operations Platform

pub mod approval;
pub mod costing;
pub mod inventory;
pub mod recipe;
pub mod tenant;
pub mod user;
pub mod waste;

pub use approval::*;
pub use costing::*;
pub use inventory::*;
pub use recipe::*;
pub use tenant::*;
pub use user::*;
pub use waste::*;
