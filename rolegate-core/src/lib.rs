// src/lib.rs

pub mod config;
pub mod inventory;
pub mod platforms;
pub mod presenter;
pub mod services;
pub mod tasks;
pub mod test_utils;
pub mod verification;

pub use rolegate_common::error::Error;
