pub mod client;

pub use client::{RobloxClient, RobloxEndpoints};
