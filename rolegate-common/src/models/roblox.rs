use serde::{Deserialize, Serialize};

/// Public profile fields the bot reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub account_id: u64,
    pub username: String,
    pub display_name: String,

    /// The user-editable "About" text. Verification codes are looked up here.
    pub description: String,
}

/// A user's role within one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMembership {
    pub group_id: u64,
    pub role_id: u64,
    pub role_name: String,

    /// Numeric rank (0-255) of `role_id`.
    pub rank: u8,
}

/// The account a command was run for, as resolved at command time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRef {
    pub account_id: u64,
    pub username: String,
}

impl AccountRef {
    pub fn profile_url(&self) -> String {
        format!("https://www.roblox.com/users/{}/profile", self.account_id)
    }
}
