// File: src/services/mod.rs

pub mod access_service;
pub mod discord;
pub mod inventory_service;

pub use access_service::AccessService;
pub use inventory_service::{InventoryLookup, InventoryService};
