// File: rolegate-common/src/models/mod.rs
pub mod access;
pub mod inventory;
pub mod roblox;
pub mod verification;

pub use access::{AccessOutcome, AccessRequest, AccessTier, MissingRequirement, RankUpdate, Requirement};
pub use inventory::{InventoryItem, ScanProgress, ScanResult, SortOrder, INVENTORY_CATALOG};
pub use roblox::{AccountRef, GroupMembership, PlayerProfile};
pub use verification::{ChallengeTicket, VerificationChallenge, VerificationKind};
