// File: rolegate-common/src/models/access.rs

use serde::{Deserialize, Serialize};

use crate::models::roblox::AccountRef;
use crate::models::verification::{ChallengeTicket, VerificationKind};

fn default_color() -> u32 {
    0xFFA500
}

/// One verification-gated slash command and the role it grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTier {
    pub kind: VerificationKind,

    /// Slash command name, e.g. `full-access`.
    pub command_name: String,
    pub description: String,

    /// Discord role granted on success.
    pub role_id: u64,

    /// Group role to rank the account into after the Discord role is given.
    #[serde(default)]
    pub group_role_id: Option<u64>,

    /// Require the code-in-profile ownership challenge before anything else.
    #[serde(default)]
    pub verify_ownership: bool,

    #[serde(default)]
    pub requirements: Vec<Requirement>,

    #[serde(default = "default_color")]
    pub color: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Requirement {
    /// Display name must contain `text` (case-sensitive).
    DisplayNameContains { text: String },

    /// Must currently be wearing at least one of `asset_ids`.
    WearingAnyOf { label: String, asset_ids: Vec<u64> },

    /// Must own `asset_id`, looked up in the `category` inventory section.
    OwnsAsset { category: String, asset_id: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissingRequirement {
    DisplayName { text: String },
    NotWearing { label: String, asset_ids: Vec<u64> },
    AssetNotOwned { category: String, asset_id: u64 },

    /// The inventory section holding the asset is private.
    InventoryPrivate { category: String },

    /// The section could not be read (invalid or rate-limited), so absence
    /// of the asset proves nothing.
    ScanInconclusive { category: String, asset_id: u64 },
}

/// The inputs a command gateway passes for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRequest {
    pub requester_id: u64,
    pub guild_id: u64,

    /// Roles the requester currently holds in `guild_id`.
    pub member_role_ids: Vec<u64>,

    /// Free-text username as typed.
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RankUpdate {
    NotConfigured,
    Updated { role_id: u64 },
    SkippedBotAccount,
    NotInGroup,
    AlreadyAtRank,
    Failed { reason: String },
}

/// Exactly one of these is produced per verification-gated command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessOutcome {
    NotFound {
        username: String,
    },
    ChallengeIssued {
        account: AccountRef,
        ticket: ChallengeTicket,
    },
    RequirementNotMet {
        account: AccountRef,
        missing: Vec<MissingRequirement>,
    },
    AlreadyHasRole {
        account: AccountRef,
        role_name: String,
    },
    Granted {
        account: AccountRef,
        role_name: String,
        rank: RankUpdate,
    },
    SystemError {
        username: String,
        detail: String,
    },
}

impl AccessOutcome {
    pub fn account(&self) -> Option<&AccountRef> {
        match self {
            AccessOutcome::ChallengeIssued { account, .. }
            | AccessOutcome::RequirementNotMet { account, .. }
            | AccessOutcome::AlreadyHasRole { account, .. }
            | AccessOutcome::Granted { account, .. } => Some(account),
            AccessOutcome::NotFound { .. } | AccessOutcome::SystemError { .. } => None,
        }
    }
}
